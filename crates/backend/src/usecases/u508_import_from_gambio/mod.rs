pub mod error;
pub mod executor;
pub mod gambio_api_client;
pub mod processors;
pub mod resolver;
pub mod scheduled_job;
pub mod transport;

pub use error::{GambioError, GambioResult};
pub use executor::{ImportExecutor, ImportOutcome};
pub use gambio_api_client::GambioApiClient;
pub use resolver::{ArticleResolution, EntityResolver};
pub use scheduled_job::GambioImportJob;
pub use transport::GambioTransport;
