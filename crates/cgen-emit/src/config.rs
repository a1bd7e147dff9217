//! Emit configuration.

/// Default version token checked by generated constructors.
pub const DEFAULT_VERSION: u32 = 0x0001_0000;

/// Code generation configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitConfig {
    /// Deepest expression nesting accepted (root is depth 0).
    pub max_expr_depth: u32,
    /// Deepest statement nesting accepted.
    pub max_body_depth: u32,
    /// Loop labels allowed per function; resume points are capped
    /// separately at the same value.
    pub max_jump_targets: u32,
    /// Hoisted temporaries allowed per function.
    pub max_temps: u32,
    /// Version token the constructors compare against.
    pub version: u32,
    /// Emit section banners in generated C code.
    pub emit_comments: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            max_expr_depth: 255,
            max_body_depth: 255,
            max_jump_targets: 1_000_000,
            max_temps: 10_000,
            version: DEFAULT_VERSION,
            emit_comments: true,
        }
    }
}

impl EmitConfig {
    #[must_use]
    pub const fn with_max_expr_depth(mut self, depth: u32) -> Self {
        self.max_expr_depth = depth;
        self
    }

    #[must_use]
    pub const fn with_max_body_depth(mut self, depth: u32) -> Self {
        self.max_body_depth = depth;
        self
    }

    #[must_use]
    pub const fn with_max_jump_targets(mut self, n: u32) -> Self {
        self.max_jump_targets = n;
        self
    }

    #[must_use]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub const fn with_comments(mut self, enabled: bool) -> Self {
        self.emit_comments = enabled;
        self
    }
}
