pub mod backend;
pub mod exchangerate_host;
pub mod hardcoded;
pub mod persisted;
pub mod util;

pub use backend::{BackendApi, ConvertPriceRequest, ConvertPriceResponse};
pub use exchangerate_host::ExchangeRateHostSource;
pub use hardcoded::HardcodedSource;
pub use persisted::PersistedSource;
pub use util::HttpClient;
