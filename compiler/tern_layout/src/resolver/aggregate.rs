//! Combining child facts into struct, tuple and enum facts.

use crate::{LayoutFact, TargetConfig};

/// Running layout of fields placed one after another.
pub(super) struct Aggregate {
    offset: u64,
    alignment: u32,
    is_trivial: bool,
    has_reference_counted_storage: bool,
    has_extra_inhabitants: bool,
    is_fixed_size: bool,
}

impl Aggregate {
    pub(super) fn new() -> Self {
        Aggregate {
            offset: 0,
            alignment: 1,
            is_trivial: true,
            has_reference_counted_storage: false,
            has_extra_inhabitants: false,
            is_fixed_size: true,
        }
    }

    pub(super) fn push(&mut self, field: &LayoutFact) {
        let alignment = field.alignment.max(1);
        self.offset = self
            .offset
            .next_multiple_of(u64::from(alignment))
            .saturating_add(field.size);
        self.alignment = self.alignment.max(alignment);
        self.is_trivial &= field.is_trivial;
        self.has_reference_counted_storage |= field.has_reference_counted_storage;
        self.has_extra_inhabitants |= field.has_extra_inhabitants;
        self.is_fixed_size &= field.is_fixed_size;
    }

    pub(super) fn finish(self, target: &TargetConfig) -> LayoutFact {
        if !self.is_fixed_size {
            return LayoutFact {
                is_trivial: false,
                has_extra_inhabitants: self.has_extra_inhabitants,
                ..LayoutFact::dependent()
            };
        }
        LayoutFact {
            has_reference_counted_storage: self.has_reference_counted_storage,
            has_extra_inhabitants: self.has_extra_inhabitants,
            ..LayoutFact::fixed(self.offset, self.alignment, self.is_trivial)
        }
        .finish(target)
    }
}

/// Layout of an enum with `payloads` (indirect cases already boxed) and
/// `empty_cases` cases without payload.
pub(super) fn enum_fact(
    payloads: &[LayoutFact],
    empty_cases: usize,
    target: &TargetConfig,
) -> LayoutFact {
    if payloads.iter().any(|payload| !payload.is_fixed_size) {
        return LayoutFact::dependent();
    }
    let is_trivial = payloads.iter().all(|payload| payload.is_trivial);
    let has_reference_counted_storage = payloads
        .iter()
        .any(|payload| payload.has_reference_counted_storage);

    match payloads {
        [] => {
            let size = tag_bytes(empty_cases);
            let capacity = 1u128 << (8 * size);
            LayoutFact {
                has_extra_inhabitants: size > 0 && (empty_cases as u128) < capacity,
                ..LayoutFact::scalar(size, target)
            }
        }
        [payload] => {
            if empty_cases == 0 || payload.has_extra_inhabitants {
                // Empty cases hide in the payload's invalid bit patterns.
                return LayoutFact {
                    is_trivial,
                    has_reference_counted_storage,
                    ..*payload
                }
                .finish(target);
            }
            LayoutFact {
                has_reference_counted_storage,
                has_extra_inhabitants: true,
                ..LayoutFact::fixed(payload.size + 1, payload.alignment, is_trivial)
            }
            .finish(target)
        }
        _ => {
            let size = payloads.iter().map(|payload| payload.size).max().unwrap_or(0);
            let alignment = payloads
                .iter()
                .map(|payload| payload.alignment)
                .max()
                .unwrap_or(1);
            LayoutFact {
                has_reference_counted_storage,
                has_extra_inhabitants: true,
                ..LayoutFact::fixed(size + 1, alignment, is_trivial)
            }
            .finish(target)
        }
    }
}

/// Tag size of an enum whose cases carry no payload.
fn tag_bytes(cases: usize) -> u64 {
    match cases {
        0 | 1 => 0,
        2..=256 => 1,
        257..=65_536 => 2,
        _ => 4,
    }
}
