pub mod to_bin;
pub mod to_srec;
pub mod verify;
