//! Synthetic sender identities
//!
//! Pattern-conforming fakes for runs without configured senders. Not unique.

use contracts::{ChannelKind, SenderIdentity};
use rand::Rng;

/// UK mobile prefix reserved for drama/testing use
const SMS_PREFIX: &str = "+4477009";

const EMAIL_DOMAIN: &str = "example.com";

/// Derive a fake identity for `channel` from `rng`
pub fn generate_identity<R: Rng + ?Sized>(channel: ChannelKind, rng: &mut R) -> SenderIdentity {
    match channel {
        ChannelKind::Sms => {
            let suffix: u32 = rng.random_range(10_000..=99_999);
            format!("{SMS_PREFIX}{suffix}").into()
        }
        ChannelKind::Email => {
            let suffix: u32 = rng.random_range(0..100_000);
            format!("delivery-test-{suffix:05}@{EMAIL_DOMAIN}").into()
        }
    }
}
