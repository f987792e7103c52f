pub mod http_webhook;
