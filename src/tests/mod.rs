mod collision;
mod compat;
mod fingerprint;
mod persistence;
mod sync;
