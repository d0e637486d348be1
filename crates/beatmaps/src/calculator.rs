use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use scorestats_models::{DifficultyAttributes, Mod, Ruleset};
use std::sync::Arc;

/// Difficulty algorithm used when attributes are calculated on the fly
/// instead of being looked up.
///
/// Calculation is CPU-bound and synchronous; the store runs it on the
/// blocking thread pool.
pub trait DifficultyCalculator: Send + Sync + 'static {
    /// Attributes of the beatmap `content` played in `ruleset` with `mods`.
    ///
    /// `content` is never empty.
    fn calculate(&self, ruleset: Ruleset, content: &[u8], mods: &[Mod]) -> Result<DifficultyAttributes>;
}

pub(crate) async fn calculate_blocking(
    calculator: Arc<dyn DifficultyCalculator>,
    ruleset: Ruleset,
    content: Vec<u8>,
    mods: Vec<Mod>,
) -> Result<DifficultyAttributes> {
    tokio::task::spawn_blocking(move || calculator.calculate(ruleset, &content, &mods))
        .await
        .or_raise(|| ErrorKind::Calculation)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorestats_models::attrib;

    struct LengthCalculator;
    impl DifficultyCalculator for LengthCalculator {
        fn calculate(&self, _ruleset: Ruleset, content: &[u8], mods: &[Mod]) -> Result<DifficultyAttributes> {
            if content.starts_with(b"broken") {
                exn::bail!(ErrorKind::Calculation);
            }
            let rate = if mods.iter().any(|m| m.is("DT")) { 1.5 } else { 1.0 };
            Ok(DifficultyAttributes::new([(attrib::STAR_RATING, content.len() as f32 * rate)]))
        }
    }

    #[tokio::test]
    async fn test_calculate_blocking() {
        let calculator: Arc<dyn DifficultyCalculator> = Arc::new(LengthCalculator);
        let attributes =
            calculate_blocking(calculator.clone(), Ruleset::Osu, b"abcd".to_vec(), vec![Mod::new("DT")]).await.unwrap();
        assert_eq!(attributes.star_rating(), Some(6.0));

        let err = calculate_blocking(calculator, Ruleset::Osu, b"broken".to_vec(), vec![]).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Calculation);
    }
}
