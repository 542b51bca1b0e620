pub mod a030_address;
pub mod a031_article;
pub mod a032_sales_order;
