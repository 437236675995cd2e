use crate::recognition::gallery::Gallery;
use crate::shared::constants::UNKNOWN_LABEL;
use crate::shared::embedding::cosine;

/// Best gallery score plus the true runner-up (the highest score among
/// all other entries, not merely the second one visited).
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub name: String,
    pub best: f64,
    pub second: f64,
}

/// A classified match: the accepted label and the winning score.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub label: String,
    pub score: f64,
}

/// Scans the gallery for the closest identity. An empty gallery yields
/// `("unknown", 0.0, -1.0)`.
pub fn best_match(embedding: &[f32], gallery: &Gallery) -> MatchOutcome {
    if gallery.is_empty() {
        return MatchOutcome {
            name: UNKNOWN_LABEL.to_string(),
            best: 0.0,
            second: -1.0,
        };
    }

    let mut best_name = UNKNOWN_LABEL;
    let mut best = -1.0f64;
    let mut second = -1.0f64;
    for (name, entry) in gallery.iter() {
        let score = cosine(embedding, entry);
        if score > best {
            second = best;
            best = score;
            best_name = name;
        } else if score > second {
            second = score;
        }
    }
    MatchOutcome {
        name: best_name.to_string(),
        best,
        second,
    }
}

impl MatchOutcome {
    /// Margin test: the best score must clear the similarity threshold
    /// AND beat the runner-up by the minimum margin. Rejects ambiguous
    /// matches between similar-looking gallery entries even when the top
    /// score alone is high.
    pub fn resolve(&self, similarity_threshold: f64, min_margin: f64) -> Resolution {
        let known =
            self.best >= similarity_threshold && (self.best - self.second) >= min_margin;
        Resolution {
            label: if known {
                self.name.clone()
            } else {
                UNKNOWN_LABEL.to_string()
            },
            score: self.best,
        }
    }
}
