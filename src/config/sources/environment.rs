//! Environment source: `DRIVESYNC_<KEY>`, nested keys joined with `__`
//! (e.g. `DRIVESYNC_REMOTE__ACCESS_TOKEN`).

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const ENV_PREFIX: &str = "DRIVESYNC";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
