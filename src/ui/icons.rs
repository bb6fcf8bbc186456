pub struct Icons;

impl Icons {
    pub const BUS: &str = "🚌";
    pub const STOP: &str = "🚏";
    pub const CLOCK: &str = "⏱️";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const STATS: &str = "📊";
    pub const EMPTY: &str = "∅";
}
