//! Shared constants and invariants

use std::time::Duration;

/// Admin tokens are issued for four hours unless configured otherwise
pub const DEFAULT_ADMIN_VALIDITY_PERIOD: Duration = Duration::from_secs(4 * 60 * 60);
/// Customer tokens are issued for one hour unless configured otherwise
pub const DEFAULT_CUSTOMER_VALIDITY_PERIOD: Duration = Duration::from_secs(60 * 60);

/// `{type}` is replaced with `admin` or `customer`
pub const TOKEN_PATH_TEMPLATE: &str = "/index.php/rest/V1/integration/{type}/token";

pub const METRICS_NAMESPACE: &str = "magento_auth";
