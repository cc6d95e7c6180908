//! Bridge run statistics.

use std::time::Duration;

use ingestion::IngestionMetricsSnapshot;
use observability::SessionMetricsAggregator;
use publisher::{BrokerDelivery, SinkMetricsSnapshot, TickDelivery};

/// Statistics from a bridge run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Events drained from the source channel
    pub events_received: u64,

    /// Ticks resolved and published
    pub ticks: u64,

    /// Operator commands parsed and applied
    pub commands_applied: u64,

    /// Operator commands that failed to parse
    pub commands_rejected: u64,

    pub broker_sent: u64,
    pub broker_throttled: u64,
    pub broker_dropped: u64,

    /// Ticks the peripheral or sensor-network queue refused
    pub local_drops: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Source-side channel counters
    pub ingestion: IngestionMetricsSnapshot,

    /// Per-sink counters taken at shutdown
    pub sinks: Vec<(String, SinkMetricsSnapshot)>,

    /// Per-tick session aggregator
    pub session: SessionMetricsAggregator,
}

impl PipelineStats {
    /// Fold one tick's delivery result in
    pub fn record_delivery(&mut self, delivery: &TickDelivery) {
        if !delivery.peripheral {
            self.local_drops += 1;
        }
        if !delivery.sensor_network {
            self.local_drops += 1;
        }
        match delivery.broker {
            BrokerDelivery::Sent => self.broker_sent += 1,
            BrokerDelivery::Throttled => self.broker_throttled += 1,
            BrokerDelivery::Dropped => self.broker_dropped += 1,
            BrokerDelivery::Disabled => {}
        }
    }

    /// Ticks per second
    pub fn tick_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Bridge Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {} ({:.2}/s)", self.ticks, self.tick_rate());
        println!("   ├─ Events received: {}", self.events_received);
        println!(
            "   ├─ Events dropped at source: {}",
            self.ingestion.events_dropped
        );
        println!(
            "   └─ Commands: {} applied, {} rejected",
            self.commands_applied, self.commands_rejected
        );

        println!("\n📤 Delivery");
        println!("   ├─ Local sink drops: {}", self.local_drops);
        println!(
            "   └─ Broker: {} sent, {} throttled, {} dropped",
            self.broker_sent, self.broker_throttled, self.broker_dropped
        );

        if !self.sinks.is_empty() {
            println!("\n🔌 Sinks");
            for (i, (name, metrics)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} written, {} failed, {} dropped",
                    prefix,
                    name,
                    metrics.write_count,
                    metrics.failure_count,
                    metrics.dropped_count
                );
            }
        }

        println!("\n{}", self.session.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_delivery() {
        let mut stats = PipelineStats::default();
        stats.record_delivery(&TickDelivery {
            peripheral: true,
            sensor_network: true,
            broker: BrokerDelivery::Sent,
        });
        stats.record_delivery(&TickDelivery {
            peripheral: false,
            sensor_network: true,
            broker: BrokerDelivery::Throttled,
        });
        stats.record_delivery(&TickDelivery {
            peripheral: false,
            sensor_network: false,
            broker: BrokerDelivery::Disabled,
        });

        assert_eq!(stats.broker_sent, 1);
        assert_eq!(stats.broker_throttled, 1);
        assert_eq!(stats.broker_dropped, 0);
        assert_eq!(stats.local_drops, 3);
    }

    #[test]
    fn test_tick_rate() {
        let stats = PipelineStats {
            ticks: 50,
            duration: Duration::from_secs(5),
            ..Default::default()
        };
        assert!((stats.tick_rate() - 10.0).abs() < f64::EPSILON);
        assert_eq!(PipelineStats::default().tick_rate(), 0.0);
    }
}
