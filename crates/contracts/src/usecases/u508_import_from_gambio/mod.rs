pub mod config;
pub mod filters;
pub mod request;
pub mod response;
pub mod source_order;

pub use config::GambioConfig;
pub use filters::OrderFilters;
pub use request::{ConnectionRequest, ImportRequest, SingleOrderRequest};
pub use response::{
    ImportErrorEntry, ImportOrderResponse, ImportResult, OrderResponse, OrdersResponse,
    TestConnectionResponse,
};
pub use source_order::{SourceAddress, SourceCustomer, SourceLineItem, SourceOrder, SourceOrderId};

use crate::usecases::common::UseCaseMetadata;

pub struct ImportFromGambio;

impl UseCaseMetadata for ImportFromGambio {
    fn usecase_index() -> &'static str {
        "u508"
    }

    fn usecase_name() -> &'static str {
        "import_from_gambio"
    }

    fn display_name() -> &'static str {
        "Импорт заказов из Gambio"
    }

    fn description() -> &'static str {
        "Загрузка заказов интернет-магазина Gambio через REST API в заказы (Auftrag)"
    }
}
