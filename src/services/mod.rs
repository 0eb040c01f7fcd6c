pub mod keygen;
pub mod listing_service;
pub mod local_store;
pub mod object_store;
pub mod storage_service;
pub mod upload_service;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;
