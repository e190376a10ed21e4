/// The JSON-compatible value type used for variable and constraint property
/// bags: scalars, lists, and string-keyed maps, matching the shapes the
/// persistence format (§6) can round-trip through `serde_json`.
///
/// This is a thin alias rather than a bespoke enum: restricting inputs to this
/// shape is an API-boundary concern (enforced in `variable`/`constraint`
/// setters), not something that needs its own variant set duplicating
/// `serde_json::Value`.
pub type Value = serde_json::Value;

/// A property bag: ordered, string-keyed, write-once-per-key (enforced by
/// callers, not by this alias).
pub type Properties = std::collections::BTreeMap<String, Value>;
