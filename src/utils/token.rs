use crate::error::{Error, Result};
use crate::utils::time;
use chrono::{DateTime, Utc};
use rand::{thread_rng, RngCore};
use sha2::{Digest, Sha512};
use std::future::Future;

const SEED_SALT_BYTES: usize = 16;

/// Hex encoded SHA-512 of the seed time and salt.
pub fn derive_token_hash(seed_time: DateTime<Utc>, salt: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(time::to_seed_string(seed_time).as_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}

pub fn candidate_token_hash() -> String {
    let mut salt = [0u8; SEED_SALT_BYTES];
    thread_rng().fill_bytes(&mut salt);
    derive_token_hash(time::now(), &salt)
}

/// Offers fresh candidate hashes to `try_claim` until one is accepted.
///
/// `try_claim` returns `Ok(None)` when the candidate is already taken. After
/// `max_tries` rejected candidates the loop fails with
/// [`Error::TokenSpaceExhausted`], which callers must not retry.
pub async fn claim_unique_hash<T, F, Fut>(max_tries: u32, mut try_claim: F) -> Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for attempt in 1..=max_tries {
        let candidate = candidate_token_hash();
        match try_claim(candidate).await? {
            Some(claimed) => return Ok(claimed),
            None => tracing::warn!(attempt, max_tries, "token hash collision, retrying"),
        }
    }
    Err(Error::TokenSpaceExhausted { tries: max_tries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn derived_hash_is_hex_sha512() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let hash = derive_token_hash(at, b"salt");
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, derive_token_hash(at, b"salt"));
        assert_ne!(hash, derive_token_hash(at, b"other"));
    }

    #[test]
    fn candidates_differ_within_the_same_instant() {
        let a = candidate_token_hash();
        let b = candidate_token_hash();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn claim_retries_past_collisions() {
        let mut rejections = 2;
        let mut offered = HashSet::new();
        let claimed = claim_unique_hash(5, |candidate| {
            offered.insert(candidate.clone());
            let accept = rejections == 0;
            if !accept {
                rejections -= 1;
            }
            async move { Ok(accept.then_some(candidate)) }
        })
        .await
        .unwrap();

        assert_eq!(offered.len(), 3);
        assert!(offered.contains(&claimed));
    }

    #[tokio::test]
    async fn claim_gives_up_after_max_tries() {
        let mut calls = 0;
        let result: Result<String> = claim_unique_hash(4, |_| {
            calls += 1;
            async { Ok(None) }
        })
        .await;

        assert_eq!(calls, 4);
        assert!(matches!(result, Err(Error::TokenSpaceExhausted { tries: 4 })));
    }

    #[tokio::test]
    async fn claim_propagates_store_errors() {
        let result: Result<String> = claim_unique_hash(3, |_| async {
            Err(Error::Database(sqlx::Error::PoolTimedOut))
        })
        .await;
        assert!(matches!(result, Err(Error::Database(sqlx::Error::PoolTimedOut))));
    }
}
