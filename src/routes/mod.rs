pub mod cancelled;
pub mod delay;
pub mod email;
pub mod health_check;
pub mod prediction;
pub mod status;
pub mod subscribe;
pub mod subscription;
pub mod unsubscribe;
