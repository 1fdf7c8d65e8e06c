mod p0001;
mod p0002;
mod p0003;
mod p0004;
mod p_5;

pub use p_5::LOADS;
