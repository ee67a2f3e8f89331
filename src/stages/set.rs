use crate::foundation::core::Bitmap;
use crate::foundation::error::{TextBlurError, TextBlurResult};

/// Precomputed blur stages, sharp to maximally blurred.
///
/// Holds `number_of_stages + 2` bitmaps. Index 0 and 1 are the same unblurred composite and
/// indices `N` and `N + 1` are the same maximally blurred composite, so an interpolator reading
/// `[i]` and `[i + 1]` for any `i` in `0..=number_of_stages` stays in bounds.
#[derive(Clone, Debug)]
pub struct StageSet {
    stages: Vec<Bitmap>,
}

impl StageSet {
    /// Build a set from `unblurred` and the blurred stages for slots `2..=N` in order.
    pub(crate) fn from_parts(unblurred: Bitmap, blurred: Vec<Bitmap>) -> TextBlurResult<Self> {
        let Some(last) = blurred.last().cloned() else {
            return Err(TextBlurError::validation(
                "a stage set needs at least one blurred stage",
            ));
        };
        let mut stages = Vec::with_capacity(blurred.len() + 2);
        stages.push(unblurred.clone());
        stages.push(unblurred);
        stages.extend(blurred);
        // `stages[N]` is the last blurred stage itself; `[N + 1]` shares its storage.
        stages.push(last);
        Ok(Self { stages })
    }

    /// Number of distinct levels `N`, sharp and maximally blurred included.
    pub fn number_of_stages(&self) -> usize {
        self.stages.len() - 2
    }

    /// Total number of bitmaps (`N + 2`).
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`; a stage set holds at least four bitmaps.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Bitmap at `index` in sharp-to-blurred order.
    pub fn get(&self, index: usize) -> Option<&Bitmap> {
        self.stages.get(index)
    }

    /// Bitmap at `index` in the direction of travel.
    ///
    /// With `reverse` the set is read blurred-to-sharp through a mirrored index; the set itself is
    /// never reordered.
    pub fn get_directional(&self, index: usize, reverse: bool) -> Option<&Bitmap> {
        if reverse {
            let mirrored = self.stages.len().checked_sub(1)?.checked_sub(index)?;
            self.stages.get(mirrored)
        } else {
            self.stages.get(index)
        }
    }

    /// The unblurred composite (stage 0).
    pub fn unblurred(&self) -> &Bitmap {
        &self.stages[0]
    }

    /// The maximally blurred composite (stages `N` and `N + 1`).
    pub fn max_blurred(&self) -> &Bitmap {
        &self.stages[self.stages.len() - 1]
    }

    /// All stages in sharp-to-blurred order.
    pub fn iter(&self) -> impl Iterator<Item = &Bitmap> {
        self.stages.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stages/set.rs"]
mod tests;
