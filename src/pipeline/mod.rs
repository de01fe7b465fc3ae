pub mod dosing;
