pub mod redemption_service;
