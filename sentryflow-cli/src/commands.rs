//! Command execution.

use crate::Commands;
use colored::Colorize;
use sentryflow_client::Client;
use sentryflow_protocol::message::RouteRecord;
use std::net::Ipv4Addr;

/// Executes a command and returns the formatted output.
pub async fn execute(client: &mut Client, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Ping { payload } => {
            let pong = client.ping(payload.as_bytes()).await?;
            Ok(format!(
                "{} {}",
                "PONG".green(),
                String::from_utf8_lossy(&pong)
            ))
        }

        Commands::Echo { text } => {
            let echoed = client.echo(text.as_bytes()).await?;
            Ok(String::from_utf8_lossy(&echoed).into_owned())
        }

        Commands::Stats => {
            let stats = client.stats().await?;
            let json = serde_json::json!({
                "total_requests": stats.total_requests,
                "bad_frames": stats.bad_frames,
                "routes_installed": stats.routes_installed,
                "uptime_ms": stats.uptime_ms,
                "last_latency_us": stats.last_latency_us,
                "avg_latency_us": stats.avg_latency_us,
            });
            Ok(serde_json::to_string_pretty(&json)?)
        }

        Commands::RouteUpdate { entries } => {
            let records = entries
                .iter()
                .map(|e| parse_entry(e))
                .collect::<Result<Vec<_>, _>>()?;
            let submitted = records.len();

            let installed = client.route_update(&records).await?;
            let verdict = if installed as usize == submitted {
                format!("{}", "Installed".green())
            } else {
                format!("{}", "Partially installed".yellow())
            };
            Ok(format!("{verdict} {installed}/{submitted} routes"))
        }

        Commands::RouteLookup { ip } => match client.route_lookup(ip).await? {
            Some(route) => Ok(format!(
                "{} {} via {} (/{}, metric {})",
                "Route".green(),
                ip.to_string().cyan(),
                route.next_hop,
                route.mask_bits,
                route.metric
            )),
            None => Ok(format!("{} for {}", "No route".yellow(), ip)),
        },
    }
}

/// Parses `prefix,mask,nextHop,metric` into a route record.
fn parse_entry(entry: &str) -> Result<RouteRecord, String> {
    let parts: Vec<&str> = entry.split(',').collect();
    if parts.len() != 4 {
        return Err(format!(
            "bad route entry '{entry}': expected prefix,mask,nextHop,metric"
        ));
    }

    let prefix: Ipv4Addr = parts[0]
        .parse()
        .map_err(|_| format!("bad prefix '{}'", parts[0]))?;
    let mask_bits: u8 = parts[1]
        .parse()
        .map_err(|_| format!("bad mask bits '{}'", parts[1]))?;
    let next_hop: Ipv4Addr = parts[2]
        .parse()
        .map_err(|_| format!("bad next hop '{}'", parts[2]))?;
    let metric: u16 = parts[3]
        .parse()
        .map_err(|_| format!("bad metric '{}'", parts[3]))?;

    Ok(RouteRecord {
        prefix,
        mask_bits,
        metric,
        next_hop,
    })
}
