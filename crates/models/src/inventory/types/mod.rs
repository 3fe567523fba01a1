mod cidr;
mod host_type;

pub use cidr::Cidr;
pub use host_type::HostType;
