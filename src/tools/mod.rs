//! Tools module - tool functions and the registry that dispatches them
//!
//! Contains extraction, weather, finance and messaging tools.

pub mod extract;
pub mod finance;
pub mod messaging;
pub mod registry;
pub mod weather;

use std::sync::Arc;

pub use extract::ExtractTool;
pub use finance::{FinanceTool, Lookup};
pub use messaging::SendTextMessageTool;
pub use registry::{FnTool, ToolFunction, ToolRegistry};
pub use weather::WeatherTool;

use crate::core::{Config, Result};
use crate::llm::Completer;

/// Register the weather deployment's tools
pub fn register_weather_tools(
    registry: &mut ToolRegistry,
    config: &Config,
    extractor: Arc<dyn Completer>,
) -> Result<()> {
    registry.register(ExtractTool::zip_code_definition(), ExtractTool::zip_code(extractor));
    registry.register(
        WeatherTool::definition(),
        WeatherTool::from_config(&config.weather)?,
    );
    Ok(())
}

/// Register the finance deployment's tools
pub fn register_finance_tools(
    registry: &mut ToolRegistry,
    config: &Config,
    extractor: Arc<dyn Completer>,
) {
    registry.register(
        ExtractTool::customer_id_definition(),
        ExtractTool::customer_id(extractor),
    );
    for lookup in [Lookup::Details, Lookup::Balance, Lookup::Invoices] {
        registry.register(
            FinanceTool::definition(lookup),
            FinanceTool::new(&config.finance.data_dir, lookup),
        );
    }
    registry.register(SendTextMessageTool::definition(), SendTextMessageTool);
}

/// Build a registry holding every tool the built-in deployments use
pub fn standard_registry(config: &Config, extractor: Arc<dyn Completer>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_weather_tools(&mut registry, config, extractor.clone())?;
    register_finance_tools(&mut registry, config, extractor);
    Ok(registry)
}
