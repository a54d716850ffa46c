//! `ping`, `alive` and `list`.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use sysinfo::System;
use tracing::warn;

use crate::commands::CommandResult;
use crate::config::{BallCatalog, BallCategory};
use crate::telegram::{ChatApi, ChatMessage, TelegramError};

/// Host figures shown on the `alive` card.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStats {
    pub system: String,
    pub cpu_percent: f32,
    pub ram_percent: f64,
}

impl Default for HostStats {
    fn default() -> Self {
        Self {
            system: "Unknown".to_owned(),
            cpu_percent: 0.0,
            ram_percent: 0.0,
        }
    }
}

impl HostStats {
    /// Samples the host. Blocks for the CPU measurement interval.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        let total = sys.total_memory();
        let ram_percent = if total == 0 {
            0.0
        } else {
            sys.used_memory() as f64 / total as f64 * 100.0
        };

        let system = match (System::name(), System::kernel_version()) {
            (Some(name), Some(kernel)) => format!("{name} {kernel}"),
            (Some(name), None) => name,
            _ => "Unknown".to_owned(),
        };

        Self {
            system,
            cpu_percent: sys.global_cpu_usage(),
            ram_percent,
        }
    }
}

/// Answers the status and catalog commands.
pub struct StatusReporter {
    api: Arc<dyn ChatApi>,
    started_at: DateTime<Utc>,
    owner_name: String,
    prefix: String,
    catalog: BallCatalog,
}

impl StatusReporter {
    #[must_use]
    pub fn new(
        api: Arc<dyn ChatApi>,
        owner_name: impl Into<String>,
        prefix: impl Into<String>,
        catalog: BallCatalog,
    ) -> Self {
        Self {
            api,
            started_at: Utc::now(),
            owner_name: owner_name.into(),
            prefix: prefix.into(),
            catalog,
        }
    }

    /// Edits the command to "..." and reports how long that took.
    pub async fn ping(&self, command: &ChatMessage) -> Result<CommandResult, TelegramError> {
        let start = Instant::now();
        self.api.edit_message(command.chat, command.id, "...").await?;
        let ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok(CommandResult::success(format!("Pong!!\n{ms:.2}ms")))
    }

    /// Replaces the command with a status card.
    pub async fn alive(&self, command: &ChatMessage) -> Result<CommandResult, TelegramError> {
        let start = Instant::now();
        self.api
            .edit_message(command.chat, command.id, "Checking...")
            .await?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let stats = tokio::task::spawn_blocking(HostStats::collect)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to collect host stats: {}", e);
                HostStats::default()
            });

        self.api.delete_messages(command.chat, &[command.id]).await?;

        let card = format!(
            "🔹 **__BOT STATUS__** 🔹\n\n\
             👤 **Owner:** `{owner}`\n\
             ⏱ **Uptime:** `{uptime}`\n\
             ⚡ **Latency:** `{latency_ms:.2}ms`\n\
             📌 **Bot Version:** `{version}`\n\n\
             🖥 **System:** `{system}`\n\
             💾 **CPU Usage:** `{cpu:.1}%`\n\
             🧠 **RAM Usage:** `{ram:.1}%`",
            owner = self.owner_name,
            uptime = format_uptime(Utc::now() - self.started_at),
            version = env!("CARGO_PKG_VERSION"),
            system = stats.system,
            cpu = stats.cpu_percent,
            ram = stats.ram_percent,
        );

        Ok(CommandResult::success(card).responding())
    }

    /// Shows the Pokémon of a ball category.
    pub fn list(&self, category: Option<&str>) -> CommandResult {
        let Some(category) = category else {
            let keys: String = BallCategory::all()
                .iter()
                .map(|c| format!("\n- `{c}`"))
                .collect();
            return CommandResult::error(format!(
                "**Usage:** `{}list <category>`\n\n**Available categories:**{keys}",
                self.prefix
            ));
        };

        let Ok(category) = category.parse::<BallCategory>() else {
            let keys: Vec<&str> = BallCategory::all().iter().map(|c| c.key()).collect();
            return CommandResult::error(format!(
                "**Invalid category!**\nUse one of: {}",
                keys.join(", ")
            ));
        };

        let names = self.catalog.get(category);
        if names.is_empty() {
            return CommandResult::error(format!("No Pokémon found in `{category}` category."));
        }

        CommandResult::success(format!(
            "**{} Ball Pokémon:**\n{}",
            category.display_name(),
            names.join(", ")
        ))
    }
}

/// Formats an uptime as `1d 2h 3m 4s`, omitting leading zero units.
fn format_uptime(uptime: TimeDelta) -> String {
    let total = uptime.num_seconds().max(0);
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
