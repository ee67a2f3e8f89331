pub(crate) mod controller;
pub(crate) mod layers;
pub(crate) mod request;
