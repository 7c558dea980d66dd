//! Synthetic traces: heavy-tailed packet sizes from a small sender population.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::LogNormal;

use crate::error::{HarnessError, Result};
use crate::trace::record::TraceRecord;

/// Largest value the estimator's signed 32-bit domain can hold.
pub const MAX_DOMAIN: u64 = 2_147_483_647;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub count: u64,
    pub id_domain_size: u64,
    /// Parameters of the underlying normal of the packet-size distribution.
    pub mu: f64,
    pub sigma: f64,
    pub max_packet_length: u64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 10_000_000,
            id_domain_size: 10,
            mu: 0.0,
            sigma: 2.0,
            max_packet_length: MAX_DOMAIN,
            seed: 0,
        }
    }
}

/// Lazy, finite stream of synthetic records. Re-seed to replay it.
pub struct TraceGenerator {
    rng: StdRng,
    sizes: LogNormal<f64>,
    ids: Uniform<u64>,
    max_packet_length: u64,
    remaining: u64,
}

impl TraceGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if config.id_domain_size == 0 {
            return Err(HarnessError::InvalidConfig(
                "id_domain_size must be at least 1".into(),
            ));
        }
        if config.max_packet_length == 0 {
            return Err(HarnessError::InvalidConfig(
                "max_packet_length must be at least 1".into(),
            ));
        }
        let sizes = LogNormal::new(config.mu, config.sigma).map_err(|e| {
            HarnessError::InvalidConfig(format!(
                "log-normal(mu={}, sigma={}): {e}",
                config.mu, config.sigma
            ))
        })?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            sizes,
            ids: Uniform::new(0, config.id_domain_size),
            max_packet_length: config.max_packet_length,
            remaining: config.count,
        })
    }
}

impl Iterator for TraceGenerator {
    type Item = TraceRecord;

    fn next(&mut self) -> Option<TraceRecord> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // `as` saturates, so huge tail samples clamp instead of wrapping.
        let sample = self.sizes.sample(&mut self.rng).floor() as u64;
        let packet_length = sample.saturating_add(1).min(self.max_packet_length);
        let sender_id = self.ids.sample(&mut self.rng);
        Some(TraceRecord::new(sender_id, packet_length))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

pub fn generate(count: u64, id_domain_size: u64) -> Result<TraceGenerator> {
    TraceGenerator::new(&GeneratorConfig {
        count,
        id_domain_size,
        ..GeneratorConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_exactly_count() {
        assert_eq!(generate(1234, 10).unwrap().count(), 1234);
        assert_eq!(generate(0, 10).unwrap().next(), None);
    }

    #[test]
    fn same_seed_same_trace() {
        let cfg = GeneratorConfig { count: 50, seed: 9, ..GeneratorConfig::default() };
        let a: Vec<_> = TraceGenerator::new(&cfg).unwrap().collect();
        let b: Vec<_> = TraceGenerator::new(&cfg).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn clamps_to_max_length() {
        let cfg = GeneratorConfig {
            count: 10_000,
            sigma: 6.0,
            max_packet_length: 100,
            ..GeneratorConfig::default()
        };
        assert!(TraceGenerator::new(&cfg).unwrap().all(|r| (1..=100).contains(&r.packet_length)));
    }

    #[test]
    fn rejects_empty_domain() {
        assert!(generate(10, 0).is_err());
        let cfg = GeneratorConfig { sigma: -1.0, ..GeneratorConfig::default() };
        assert!(TraceGenerator::new(&cfg).is_err());
    }
}
