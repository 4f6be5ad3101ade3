mod settings;

pub use settings::{LogConfig, RenderConfig, ServerConfig, Settings, StoreConfig};
