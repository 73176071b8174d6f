//! The `gatemarks init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create gatemarks.toml
    if std::path::Path::new("gatemarks.toml").exists() {
        println!("gatemarks.toml already exists, skipping.");
    } else {
        std::fs::write("gatemarks.toml", SAMPLE_CONFIG)?;
        println!("Created gatemarks.toml");
    }

    // Create example answer key
    std::fs::create_dir_all("answer-keys")?;
    let example_path = std::path::Path::new("answer-keys/example.toml");
    if example_path.exists() {
        println!("answer-keys/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_KEY)?;
        println!("Created answer-keys/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Replace answer-keys/example.toml with the official key (TOML, text, or PDF)");
    println!("  2. Run: gatemarks validate-key --answer-key answer-keys/example.toml");
    println!("  3. Run: gatemarks score --sheet <response sheet URL>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gatemarks configuration

answer_key = "answer-keys/example.toml"
parallelism = 4
max_retries = 2
retry_delay_ms = 1000
output_dir = "./gatemarks-results"

[fetch]
timeout_secs = 30
insecure_fallback = true

# Shared rank table. REDIS_URL or KV_REST_API_URL/KV_REST_API_TOKEN
# in the environment override this section.
[store]
type = "memory"

# [store]
# type = "redis"
# url = "${REDIS_URL}"

# [store]
# type = "kv_rest"
# url = "${KV_REST_API_URL}"
# token = "${KV_REST_API_TOKEN}"
"#;

const EXAMPLE_KEY: &str = r#"# Example answer key. Marks and sections default to the GATE DA layout.

[exam]
name = "Example DA"

[[questions]]
number = 1
type = "MCQ"
answer = "B"

[[questions]]
number = 2
type = "MSQ"
answer = ["A", "C"]

[[questions]]
number = 3
type = "NAT"
answer = "4.9 to 5.1"
"#;
