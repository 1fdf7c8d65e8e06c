mod p0001;
mod p0003;
mod p0010;
mod p0014;
mod p0022;
mod p_7;
