//! Telemetry API Example
//!
//! Describes a handful of metering and orchestration operations as request
//! descriptors and runs them through one invoker.
//!
//! ```sh
//! TELEMETRY_URL=http://localhost:8777 OS_TOKEN=... RUST_LOG=courier=debug \
//!     cargo run -p telemetry-api-demo
//! ```

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use courier::prelude::*;
use futures_util::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Data Types
// ============================================================================

/// A meter known to the metering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub unit: String,
    pub resource_id: String,
}

/// Aggregated samples over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub count: u64,
    pub avg: f64,
    pub max: f64,
    pub period: u64,
}

/// An orchestration stack summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub id: String,
    pub stack_name: String,
    pub stack_status: String,
}

// ============================================================================
// Operations
// ============================================================================

/// Every operation of the telemetry service.
fn telemetry_catalog() -> Result<Catalog> {
    Catalog::builder("telemetry")
        .operation(
            RequestDescriptor::get("list_meters", "/v2/meters")
                .bind(ParameterBinding::query("q.field"))
                .bind(ParameterBinding::query("q.value"))
                .shape(ResultShape::Sequence)
                .fallback(Fallback::on_not_found(FallbackPolicy::EmptyList)),
        )
        .operation(
            RequestDescriptor::get("statistics", "/v2/meters/{meter}/statistics")
                .bind(ParameterBinding::path("meter"))
                .bind(ParameterBinding::query("period"))
                .bind(ParameterBinding::query("groupby").transform(Transform::Csv))
                .shape(ResultShape::Sequence)
                .fallback(Fallback::on_not_found(FallbackPolicy::EmptyList)),
        )
        .operation(
            RequestDescriptor::get("list_stacks", "/stacks")
                .bind(ParameterBinding::query("status"))
                .selector("stacks")
                .paginate(Pagination::next_link("links"))
                .fallback(Fallback::on_not_found(FallbackPolicy::EmptyIterable)),
        )
        .operation(
            RequestDescriptor::delete("delete_alarm", "/v2/alarms/{id}")
                .bind(ParameterBinding::path("id"))
                .shape(ResultShape::Acknowledge)
                .fallback(Fallback::on_not_found(FallbackPolicy::FalseValue)),
        )
        .build()
}

fn telemetry_client(token: Option<String>) -> HyperClient {
    let builder = HyperClient::builder().with_retry(3).with_logging();
    match token {
        Some(token) => builder.with_token_auth(token).build(),
        None => builder.build(),
    }
}

async fn report(invoker: &ApiInvoker<HyperClient>, catalog: &Catalog) -> Result<()> {
    let meters: Vec<Meter> = catalog_call(invoker, catalog, "list_meters", &Arguments::new()).await?;
    println!("{} meters", meters.len());

    if let Some(meter) = meters.first() {
        let args = Arguments::new()
            .with("meter", meter.name.as_str())
            .with("period", 600_u32)
            .with("groupby", vec!["resource_id"]);
        let statistics: Vec<Statistics> =
            catalog_call(invoker, catalog, "statistics", &args).await?;
        for period in &statistics {
            println!(
                "{}: count={} avg={:.2} max={:.2}",
                meter.name, period.count, period.avg, period.max
            );
        }
    }

    let mut stacks = invoker
        .paged_named(
            catalog,
            "list_stacks",
            Arguments::new().with("status", "CREATE_COMPLETE"),
            Some(50),
        )?
        .typed::<Stack>();
    while let Some(stack) = stacks.next().await {
        let stack = stack?;
        println!("{} {} {}", stack.id, stack.stack_name, stack.stack_status);
    }

    Ok(())
}

async fn catalog_call<T: serde::de::DeserializeOwned>(
    invoker: &ApiInvoker<HyperClient>,
    catalog: &Catalog,
    name: &str,
    args: &Arguments,
) -> Result<T> {
    invoker.invoke_named(catalog, name, args).await?.into_typed()
}

// ============================================================================
// Main: Demonstrate usage
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = telemetry_catalog()?;
    println!("Catalog `{}`:", catalog.service());
    for name in catalog.names() {
        println!("  {name}");
    }

    let Ok(base_url) = std::env::var("TELEMETRY_URL") else {
        println!("\nSet TELEMETRY_URL to run the operations against a live endpoint.");
        return Ok(());
    };

    let invoker = ApiInvoker::new(telemetry_client(std::env::var("OS_TOKEN").ok()), &base_url)?;
    info!(base_url = %invoker.base_url(), "running telemetry report");
    report(&invoker, &catalog).await
}

// ============================================================================
// Tests using wiremock
// ============================================================================
