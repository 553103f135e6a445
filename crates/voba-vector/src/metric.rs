use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance.
    L2,
    /// `1 - cos(a, b)`, in `[0, 2]`.
    Cosine,
}

impl DistanceMetric {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "l2" => Some(Self::L2),
            "cosine" => Some(Self::Cosine),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self { Self::L2 => "l2", Self::Cosine => "cosine" }
    }

    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if na <= f32::EPSILON || nb <= f32::EPSILON { return 1.0; }
                (1.0 - dot / (na * nb)).clamp(0.0, 2.0)
            }
        }
    }
}
