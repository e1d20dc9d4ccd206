use serde::{Deserialize, Serialize};

/// Source of the memory: did the model infer it was worth remembering, or
/// did the user explicitly ask to be remembered?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Active,
    Passive,
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Passive => write!(f, "passive"),
        }
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "passive" => Ok(Self::Passive),
            other => Err(format!("unknown memory type: {other}")),
        }
    }
}

/// Decay class assigned by the cleaner's deterministic category classifier.
/// `Fact`/`Preference` never decay and are immune to R1 in the scheduled GC;
/// `Event`/`Desire` decay with age and are GC's primary target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Fact,
    Preference,
    Event,
    Desire,
}

impl MemoryCategory {
    pub fn decays(self) -> bool {
        matches!(self, MemoryCategory::Event | MemoryCategory::Desire)
    }
}

impl std::fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fact => write!(f, "fact"),
            Self::Preference => write!(f, "preference"),
            Self::Event => write!(f, "event"),
            Self::Desire => write!(f, "desire"),
        }
    }
}

impl std::str::FromStr for MemoryCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fact" => Ok(Self::Fact),
            "preference" => Ok(Self::Preference),
            "event" => Ok(Self::Event),
            "desire" => Ok(Self::Desire),
            other => Err(format!("unknown memory category: {other}")),
        }
    }
}

/// Structured entities extracted by the cleaner's classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
            && self.locations.is_empty()
            && self.people.is_empty()
            && self.events.is_empty()
    }
}

/// A single persisted distillation of a stretch of dialogue — the central
/// entity of the memory subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMemory {
    pub id: String,
    pub user_id: String,
    pub system_instruction_id: String,

    pub summary: String,
    pub key_points: Vec<String>,
    /// Always `None` in this implementation — space savings; the summary
    /// and entities already capture what retrieval needs. See DESIGN.md.
    pub original_content: Option<String>,
    pub entities: Entities,

    /// Dense embedding of `summary`, or `None` if the embedding endpoint is
    /// unavailable — retrieval falls back to lexical similarity.
    pub embedding: Option<Vec<f32>>,

    pub memory_type: MemoryType,
    pub memory_category: MemoryCategory,

    /// 1-10, assigned by the cleaner's classifier LLM.
    pub importance_score: i32,
    /// `importance_score / 10`, always in `[0.1, 1.0]`.
    pub semantic_importance: f64,
    /// `[0.1, 1.0]` intensity from the emotion-scoring LLM call.
    pub emotional_weight: f64,

    pub created_at_timestamp: chrono::DateTime<chrono::Utc>,
    pub last_accessed: chrono::DateTime<chrono::Utc>,
    pub access_count: i64,

    pub is_deleted: bool,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    /// The multiple of `batch_size` at which this record was produced.
    pub conversation_round: i64,
}

impl ConversationMemory {
    /// `importance_score / 10`, clamped into `[0.1, 1.0]` per §3.
    pub fn derive_semantic_importance(importance_score: i32) -> f64 {
        (importance_score as f64 / 10.0).clamp(0.1, 1.0)
    }
}
