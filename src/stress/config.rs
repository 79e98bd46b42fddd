//! Stress driver configuration.
//!
//! Values are validated once, when the configuration is built, so the driver
//! itself never has to re-check them.

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value is outside its accepted range.
    InvalidValue {
        /// The name of the offending setting.
        key: &'static str,
        /// Description of why the value is invalid.
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => {
                write!(formatter, "Invalid value for {key}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings of a [`StressDriver`](super::StressDriver) run.
///
/// # Fields
///
/// - `slot_count`: number of array variables the input can address
/// - `max_size`: pushes onto a source larger than this are skipped
/// - `push_value`: element appended by sharing pushes
/// - `move_push_value`: element appended by ownership-transfer pushes
/// - `verify_model`: mirror every slot in a `Vec` and compare after each step
///
/// # Examples
///
/// ```rust
/// use persistent_array::stress::StressConfig;
///
/// let config = StressConfig::default();
/// assert_eq!(config.slot_count(), 4);
/// assert_eq!(config.max_size(), 1 << 10);
///
/// assert!(StressConfig::new(0, 16).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StressConfig {
    slot_count: usize,
    max_size: usize,
    push_value: i32,
    move_push_value: i32,
    verify_model: bool,
}

impl StressConfig {
    /// Largest slot count a single input byte can address.
    pub const MAX_SLOT_COUNT: usize = 1 << u8::BITS;

    /// Creates a configuration with the given slot count and size bound and
    /// default values for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `slot_count` is zero or larger
    /// than [`Self::MAX_SLOT_COUNT`].
    pub fn new(slot_count: usize, max_size: usize) -> Result<Self, ConfigError> {
        if slot_count == 0 || slot_count > Self::MAX_SLOT_COUNT {
            return Err(ConfigError::InvalidValue {
                key: "slot_count",
                message: format!(
                    "must be between 1 and {}, got {slot_count}",
                    Self::MAX_SLOT_COUNT
                ),
            });
        }
        Ok(Self {
            slot_count,
            max_size,
            ..Self::default()
        })
    }

    /// Sets the elements appended by sharing and by ownership-transfer pushes.
    #[must_use]
    pub const fn with_push_values(mut self, push_value: i32, move_push_value: i32) -> Self {
        self.push_value = push_value;
        self.move_push_value = move_push_value;
        self
    }

    /// Enables or disables the `Vec` mirror check.
    #[must_use]
    pub const fn with_model_verification(mut self, verify_model: bool) -> Self {
        self.verify_model = verify_model;
        self
    }

    /// Number of addressable slots.
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Size above which pushes are skipped.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Element appended by sharing pushes.
    #[must_use]
    pub const fn push_value(&self) -> i32 {
        self.push_value
    }

    /// Element appended by ownership-transfer pushes.
    #[must_use]
    pub const fn move_push_value(&self) -> i32 {
        self.move_push_value
    }

    /// Whether every step is checked against a `Vec` mirror.
    #[must_use]
    pub const fn verify_model(&self) -> bool {
        self.verify_model
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            slot_count: 4,
            max_size: 1 << 10,
            push_value: 42,
            move_push_value: 12,
            verify_model: true,
        }
    }
}
