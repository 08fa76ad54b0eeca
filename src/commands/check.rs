//! Check command implementation.
//!
//! Validates the configuration and runs one collection the way the plugin
//! would before registering its charts.

use hdd_space_exporter::DfService;

use crate::config::{validate_effective_config, Config};

/// Validates configuration and prints the charts that would be registered.
pub async fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 HDD Space Exporter - Check");
    println!("=============================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }

    let job = config.job();
    let mut service = DfService::new(&job)?;

    println!("\n💽 Collecting from {}...", service.source().describe());
    println!("   Filter: {}", service.filter().as_str());
    match service.check().await {
        Ok(definitions) => {
            let devices: usize = definitions.first().map_or(0, |d| d.lines.len());
            if devices == 0 {
                println!("   ⚠️  No devices match - nothing would be reported");
            } else {
                println!("   ✅ {} device(s) matched", devices);
            }

            println!("\n📊 Charts:");
            for (idx, chart) in definitions.iter().enumerate() {
                println!(
                    "   ├─ {} ({}, priority {})",
                    chart.id,
                    chart.unit,
                    job.priority + idx as u64
                );
                for line in &chart.lines {
                    println!("   │  └─ {} [{}]", line.id, line.name);
                }
            }
        }
        Err(e) => {
            println!("   ❌ Collection failed: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed");
        std::process::exit(1);
    }
}
