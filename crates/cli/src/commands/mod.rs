pub mod doctor;
pub mod evidence;
pub mod gateway;
pub mod onboard;
pub mod status;
