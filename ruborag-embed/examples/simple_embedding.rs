//! Embed two sentences with the hosted model and compare them.
//!
//! Run with: GEMINI_API_KEY=... cargo run -p ruborag-embed --example simple_embedding

use ruborag_embed::{EmbedConfig, EmbeddingProvider, GeminiProvider};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = EmbedConfig::default();
    println!("Model:    {}", config.model);
    println!("Endpoint: {}", config.endpoint());

    let provider = GeminiProvider::from_env(config)?;

    let texts = [
        "Each value in Rust has an owner.",
        "When the owner goes out of scope, the value is dropped.",
    ];

    let mut vectors = Vec::with_capacity(texts.len());
    for text in texts {
        let embedding = provider.embed_text(text).await?;
        println!(
            "\"{text}\" -> {} dims, first 3: {:?}",
            embedding.len(),
            &embedding[..3.min(embedding.len())]
        );
        vectors.push(embedding);
    }

    println!("Similarity: {:.4}", cosine(&vectors[0], &vectors[1]));
    Ok(())
}
