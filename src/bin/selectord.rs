//! selectord - run the detection selector as a live pipeline stage.
//!
//! The stage:
//! 1. Subscribes to the upstream MQTT topic carrying serialized frame messages
//! 2. Evaluates every payload with the detection selector
//! 3. Republishes forwarded messages, byte-for-byte, on the downstream topic
//!
//! Suppressed messages produce no output. Messages that fail to decode are
//! logged and skipped so one bad payload cannot stall the stage; dead-letter
//! handling, if any, belongs to the surrounding pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, Incoming, MqttOptions};
use std::time::Duration;

use detection_selector::transport::{parse_mqtt_endpoint, validate_loopback_addr, MqttEndpoint};
use detection_selector::{DetectionSelector, SelectorConfig};

const STAGE_NAME: &str = "selectord";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Forward notable frame messages between pipeline topics"
)]
struct Args {
    /// MQTT broker address.
    /// By default, only loopback addresses are allowed.
    /// Use --allow-remote-mqtt for a broker on a trusted network.
    #[arg(long, env = "MQTT_BROKER_ADDR", default_value = "127.0.0.1:1883")]
    mqtt_broker_addr: String,

    /// Allow non-loopback MQTT connections.
    #[arg(long, env = "ALLOW_REMOTE_MQTT")]
    allow_remote_mqtt: bool,

    /// MQTT username for authentication.
    #[arg(long, env = "MQTT_USERNAME")]
    mqtt_username: Option<String>,

    /// MQTT password for authentication.
    #[arg(long, env = "MQTT_PASSWORD")]
    mqtt_password: Option<String>,

    /// Topic carrying serialized frame messages from the upstream stage.
    #[arg(long, env = "SELECTOR_INPUT_TOPIC", default_value = "pipeline/frames")]
    input_topic: String,

    /// Topic forwarded messages are published on.
    #[arg(
        long,
        env = "SELECTOR_OUTPUT_TOPIC",
        default_value = "pipeline/frames_selected"
    )]
    output_topic: String,

    /// MQTT client identifier.
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = STAGE_NAME)]
    mqtt_client_id: String,
}

fn main() -> Result<()> {
    let config = SelectorConfig::load().context("load selector configuration")?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    let args = Args::parse();

    let endpoint = parse_mqtt_endpoint(&args.mqtt_broker_addr)?;
    if !args.allow_remote_mqtt {
        validate_loopback_addr(&endpoint, &args.mqtt_broker_addr)?;
    } else {
        log::warn!("Remote MQTT enabled - ensure broker is in a trusted network");
    }

    log::info!("Detection selector starting");
    log::info!("  MQTT broker: {}:{}", endpoint.host, endpoint.port);
    log::info!("  Input topic: {}", args.input_topic);
    log::info!("  Output topic: {}", args.output_topic);
    log::info!("  Min confidence: {}", config.min_confidence);
    log::info!("  Min box size: {}x{}", config.min_width, config.min_height);
    log::info!("  Max detections: {}", config.max_detections);
    log::info!("  Passthrough period: {}", config.time_past);

    let mut selector = DetectionSelector::new(config)?;

    loop {
        let (client, mut connection) = connect_mqtt(
            &endpoint,
            &args.mqtt_client_id,
            args.mqtt_username.as_deref(),
            args.mqtt_password.as_deref(),
        )?;
        client.subscribe(&args.input_topic, QoS::AtMostOnce)?;
        log::info!("Subscribed to {}", args.input_topic);

        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    match selector.evaluate(&publish.payload) {
                        Ok(Some(bytes)) => {
                            if let Err(e) =
                                client.publish(&args.output_topic, QoS::AtMostOnce, false, bytes)
                            {
                                log::error!("Failed to publish forwarded message: {}", e);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            log::warn!("Skipping message: {}", e);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("MQTT connection error: {}. Reconnecting...", e);
                    break;
                }
            }
        }

        std::thread::sleep(Duration::from_secs(5));
    }
}

fn connect_mqtt(
    endpoint: &MqttEndpoint,
    client_id: &str,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<(Client, Connection)> {
    let mut options = MqttOptions::new(client_id, &endpoint.host, endpoint.port);
    options.set_keep_alive(Duration::from_secs(60));
    options.set_clean_start(true);
    if let Some(user) = username {
        options.set_credentials(user, password.unwrap_or_default());
    }

    let (client, connection) = Client::new(options, 10);
    log::info!(
        "Connected to MQTT broker (auth: {})",
        username.is_some()
    );
    Ok((client, connection))
}
