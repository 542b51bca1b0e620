// UseCase handlers
pub mod u508_import_from_gambio;
