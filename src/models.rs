use serde::{Deserialize, Deserializer, Serialize};

/// One raw observation from an inventory export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(
        default = "default_device_count",
        alias = "deviceCount",
        deserialize_with = "deserialize_device_count"
    )]
    pub device_count: u32,
}

impl InventoryEntry {
    pub fn new(name: impl Into<String>, publisher: impl Into<String>, device_count: u32) -> Self {
        Self {
            name: name.into(),
            publisher: publisher.into(),
            device_count: device_count.max(1),
        }
    }
}

fn default_device_count() -> u32 {
    1
}

/// Parse a raw device count. Anything missing, non-numeric or below one counts as a single device.
pub fn parse_device_count(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 1;
    };

    if let Ok(n) = raw.parse::<i64>() {
        return clamp_count(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => clamp_count(f.trunc() as i64),
        _ => 1,
    }
}

fn clamp_count(n: i64) -> u32 {
    if n < 1 {
        1
    } else {
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}

fn deserialize_device_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let count = match raw {
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => clamp_count(i),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| clamp_count(f.trunc() as i64))
                .unwrap_or(1),
        },
        Some(serde_json::Value::String(s)) => parse_device_count(Some(&s)),
        _ => 1,
    };
    Ok(count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::Exact => write!(f, "exact"),
            PatternType::Contains => write!(f, "contains"),
            PatternType::StartsWith => write!(f, "startswith"),
            PatternType::EndsWith => write!(f, "endswith"),
            PatternType::Regex => write!(f, "regex"),
        }
    }
}

/// A pattern that drops matching entries from the catalog as noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRule {
    #[serde(default)]
    pub id: u64,
    pub pattern_type: PatternType,
    pub pattern_value: String,
    pub category: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A pattern that maps raw names onto a canonical product identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(default)]
    pub id: u64,
    pub pattern_type: PatternType,
    pub original_pattern: String,
    pub canonical_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub deployment_type: Option<DeploymentType>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeploymentType {
    #[default]
    Desktop,
    SaaS,
    Both,
}

impl std::fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentType::Desktop => write!(f, "Desktop"),
            DeploymentType::SaaS => write!(f, "SaaS"),
            DeploymentType::Both => write!(f, "Both"),
        }
    }
}

/// All inventory entries that resolved to one canonical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAggregate {
    pub canonical_name: String,
    pub category: String,
    pub deployment_type: DeploymentType,
    pub description: String,
    pub original_entries: Vec<InventoryEntry>,
    pub original_count: usize,
    pub total_devices: u64,
}

impl CanonicalAggregate {
    /// Seed an aggregate from the rule that first produced its canonical name.
    pub fn seeded_from(rule: &MappingRule) -> Self {
        let category = if rule.category.trim().is_empty() {
            "Uncategorized".to_string()
        } else {
            rule.category.clone()
        };

        Self {
            canonical_name: rule.canonical_name.clone(),
            category,
            deployment_type: rule.deployment_type.unwrap_or_default(),
            description: rule.description.clone(),
            original_entries: Vec::new(),
            original_count: 0,
            total_devices: 0,
        }
    }

    pub fn push(&mut self, entry: InventoryEntry) {
        self.original_entries.push(entry);
    }

    /// Recompute the derived counters from the contributing entries.
    pub fn finish(&mut self) {
        self.original_count = self.original_entries.len();
        self.total_devices = self
            .original_entries
            .iter()
            .map(|e| u64::from(e.device_count.max(1)))
            .sum();
    }
}

/// Administrative decision status for a canonical product.
///
/// Values outside the known vocabulary are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Disposition {
    #[default]
    Pending,
    Approved,
    Replace,
    Retire,
    Other(String),
}

impl From<String> for Disposition {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Disposition::Pending,
            "approved" => Disposition::Approved,
            "replace" => Disposition::Replace,
            "retire" => Disposition::Retire,
            _ => Disposition::Other(raw),
        }
    }
}

impl From<Disposition> for String {
    fn from(d: Disposition) -> Self {
        d.to_string()
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::Pending => write!(f, "pending"),
            Disposition::Approved => write!(f, "approved"),
            Disposition::Replace => write!(f, "replace"),
            Disposition::Retire => write!(f, "retire"),
            Disposition::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispositionRecord {
    pub canonical_name: String,
    #[serde(default)]
    pub disposition: Disposition,
    /// Reference to an approved-software record.
    #[serde(default)]
    pub replacement_id: Option<u64>,
    #[serde(default)]
    pub replacement_name: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl DispositionRecord {
    pub fn pending(canonical_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            disposition: Disposition::Pending,
            replacement_id: None,
            replacement_name: None,
            notes: String::new(),
        }
    }
}

/// An aggregate joined with its disposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludedProduct {
    #[serde(flatten)]
    pub aggregate: CanonicalAggregate,
    pub disposition: Disposition,
    pub replacement_id: Option<u64>,
    pub replacement_name: Option<String>,
    pub disposition_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedEntry {
    pub name: String,
    /// Category of the exclusion rule that matched.
    pub reason: String,
    pub rule_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmappedEntry {
    pub name: String,
    pub publisher: String,
    pub device_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    Json,
    Csv,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Json => write!(f, "JSON"),
            InputFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// Result of a single analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub included: Vec<IncludedProduct>,
    pub excluded: Vec<ExcludedEntry>,
    pub unmapped: Vec<UnmappedEntry>,
}
