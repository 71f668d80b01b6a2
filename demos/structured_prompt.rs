//! Structured prompt against Gemini, or the mock driver when no API key is set.
//!
//! Run with:
//!   GEMINI_API_KEY=... RUST_LOG=fluent_llm=debug cargo run --example structured_prompt

use fluent_llm::drivers::{BackendDriver, GeminiDriver, MockDriver};
use fluent_llm::{CancellationToken, Model};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
struct Recipe {
    /// Name of the dish.
    name: String,
    servings: u32,
    ingredients: Vec<String>,
}

async fn run<D: BackendDriver>(model: Model<D>) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let recipe_schema = model.new_schema().from_type::<Recipe>()?;
    let response = model
        .prompt("Give me a simple pancake recipe.")
        .with_schema(recipe_schema)
        .execute(&cancel)
        .await?;
    let recipe: Recipe = response.decode()?;
    println!("{} -> {:?}", model, recipe);

    let b = model.new_schema();
    let review = b.object(
        "review",
        vec![
            b.string("verdict", vec![b.required()]).into(),
            b.integer("stars", vec![b.required(), b.description("1 to 5")]).into(),
        ],
    );
    let response = model
        .prompt(format!("Review this recipe: {}", response.text()))
        .with_schema(review)
        .execute(&cancel)
        .await?;
    println!("{}", response);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let credentials = GeminiDriver::credentials_from_env();
    if credentials.key().is_some() {
        let model = Model::builder(GeminiDriver::from_env()?, "gemini-2.0-flash")
            .credentials(credentials)
            .build()?;
        run(model).await
    } else {
        println!("GEMINI_API_KEY not set, using the mock driver");
        let driver = MockDriver::new();
        driver.push_reply(
            r#"{"name": "Pancakes", "servings": 4, "ingredients": ["flour", "milk", "eggs"]}"#,
        );
        driver.push_reply(r#"{"verdict": "classic", "stars": 4}"#);
        run(Model::new(driver, "mock-1")?).await
    }
}
