//! Head sampling.

use common::SamplerKind;
use domain::{SpanContext, TraceId};

/// Whether a new span records and is exported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingDecision {
    /// Non-recording span, sampled flag cleared
    Drop,
    /// Recording span, sampled flag set
    RecordAndSample,
}

/// Decides, at span start, whether a span is sampled.
#[derive(Clone, Debug, PartialEq)]
pub enum Sampler {
    AlwaysOn,
    AlwaysOff,
    /// Samples the given fraction of traces, consistently per trace id
    TraceIdRatioBased(f64),
    /// Follows a valid parent's sampled flag; roots use the inner sampler
    ParentBased(Box<Sampler>),
}

impl Sampler {
    pub fn parent_based(root: Sampler) -> Self {
        Sampler::ParentBased(Box::new(root))
    }

    pub fn from_kind(kind: SamplerKind, ratio: f64) -> Self {
        match kind {
            SamplerKind::AlwaysOn => Sampler::AlwaysOn,
            SamplerKind::AlwaysOff => Sampler::AlwaysOff,
            SamplerKind::TraceIdRatio => Sampler::TraceIdRatioBased(ratio),
            SamplerKind::ParentBasedAlwaysOn => Sampler::parent_based(Sampler::AlwaysOn),
            SamplerKind::ParentBasedAlwaysOff => Sampler::parent_based(Sampler::AlwaysOff),
            SamplerKind::ParentBasedTraceIdRatio => {
                Sampler::parent_based(Sampler::TraceIdRatioBased(ratio))
            }
        }
    }

    pub fn should_sample(&self, parent: Option<&SpanContext>, trace_id: TraceId) -> SamplingDecision {
        match self {
            Sampler::AlwaysOn => SamplingDecision::RecordAndSample,
            Sampler::AlwaysOff => SamplingDecision::Drop,
            Sampler::TraceIdRatioBased(ratio) => sample_ratio(*ratio, trace_id),
            Sampler::ParentBased(root) => match parent.filter(|parent| parent.is_valid()) {
                Some(parent) if parent.is_sampled() => SamplingDecision::RecordAndSample,
                Some(_) => SamplingDecision::Drop,
                None => root.should_sample(None, trace_id),
            },
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Sampler::parent_based(Sampler::AlwaysOn)
    }
}

fn sample_ratio(ratio: f64, trace_id: TraceId) -> SamplingDecision {
    if ratio >= 1.0 {
        return SamplingDecision::RecordAndSample;
    }
    if ratio.is_nan() || ratio <= 0.0 {
        return SamplingDecision::Drop;
    }

    let bytes = trace_id.to_bytes();
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[8..]);
    let bound = (ratio * (1u64 << 63) as f64) as u64;

    if u64::from_be_bytes(low) >> 1 < bound {
        SamplingDecision::RecordAndSample
    } else {
        SamplingDecision::Drop
    }
}

#[cfg(test)]
mod tests {
    use domain::{SpanId, TraceFlags, TraceState};

    use super::*;

    fn parent(sampled: bool) -> SpanContext {
        SpanContext::new(
            TraceId::from(1u128),
            SpanId::from(1u64),
            TraceFlags::DEFAULT.with_sampled(sampled),
            true,
            TraceState::default(),
        )
    }

    #[test]
    fn test_always_samplers() {
        let id = TraceId::from(42u128);
        assert_eq!(Sampler::AlwaysOn.should_sample(None, id), SamplingDecision::RecordAndSample);
        assert_eq!(Sampler::AlwaysOff.should_sample(None, id), SamplingDecision::Drop);
    }

    #[test]
    fn test_parent_based_follows_parent_flag() {
        let sampler = Sampler::parent_based(Sampler::AlwaysOff);
        let id = TraceId::from(1u128);

        assert_eq!(
            sampler.should_sample(Some(&parent(true)), id),
            SamplingDecision::RecordAndSample
        );
        assert_eq!(sampler.should_sample(Some(&parent(false)), id), SamplingDecision::Drop);
        // Root spans use the inner sampler
        assert_eq!(sampler.should_sample(None, id), SamplingDecision::Drop);
        assert_eq!(
            sampler.should_sample(Some(&SpanContext::empty()), id),
            SamplingDecision::Drop
        );
    }

    #[test]
    fn test_ratio_bounds() {
        let low = TraceId::from(1u128);
        let high = TraceId::from(u128::MAX);

        assert_eq!(sample_ratio(1.0, high), SamplingDecision::RecordAndSample);
        assert_eq!(sample_ratio(0.0, low), SamplingDecision::Drop);
        assert_eq!(sample_ratio(f64::NAN, low), SamplingDecision::Drop);
        assert_eq!(sample_ratio(0.5, low), SamplingDecision::RecordAndSample);
        assert_eq!(sample_ratio(0.5, high), SamplingDecision::Drop);
    }

    #[test]
    fn test_ratio_is_roughly_proportional() {
        let sampled = (0..10_000u128)
            .map(|i| TraceId::from(i.wrapping_mul(0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c835)))
            .filter(|id| sample_ratio(0.25, *id) == SamplingDecision::RecordAndSample)
            .count();
        assert!((2_000..3_000).contains(&sampled), "sampled {}", sampled);
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(
            Sampler::from_kind(SamplerKind::ParentBasedTraceIdRatio, 0.1),
            Sampler::parent_based(Sampler::TraceIdRatioBased(0.1))
        );
        assert_eq!(Sampler::default(), Sampler::from_kind(SamplerKind::default(), 1.0));
    }
}
