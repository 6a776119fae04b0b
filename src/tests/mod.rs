pub mod common;

mod magento_request;
