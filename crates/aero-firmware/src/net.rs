//! Wi-Fi bootstrap, NTP time seed, and telemetry upload.
//!
//! The appliance is functional without any of this: if the access point or
//! NTP server is unreachable the display pipeline still runs, the clock line
//! shows a placeholder, and uploads are skipped.

use aero_core::telemetry::TelemetryRecord;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer, with_timeout};
use embedded_io_async::{Read, Write};
use esp_radio::wifi::{
    ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiState,
};
use log::{info, warn};
use thiserror_no_std::Error;

/// Telemetry channel ingestion endpoint.
const TELEMETRY_HOST: &str = "ambidata.io";
const TELEMETRY_PORT: u16 = 80;

const NTP_PORT: u16 = 123;

/// Seconds between the NTP era (1900) and the unix epoch.
const NTP_UNIX_OFFSET: u32 = 2_208_988_800;

#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Keep the station associated, reconnecting after drops.
#[embassy_executor::task]
pub async fn wifi_task(
    mut controller: WifiController<'static>,
    ssid: &'static str,
    password: &'static str,
) {
    info!("Wifi check...");
    loop {
        if esp_radio::wifi::wifi_state() == WifiState::StaConnected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("Wi-Fi disconnected");
            Timer::after_secs(5).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.into(),
                password: password.into(),
                ..Default::default()
            });
            if let Err(e) = controller.set_configuration(&config) {
                warn!("Wi-Fi configuration failed: {:?}", e);
            }
            if let Err(e) = controller.start_async().await {
                warn!("Wi-Fi start failed: {:?}", e);
                Timer::after_secs(5).await;
                continue;
            }
        }

        match controller.connect_async().await {
            Ok(()) => info!("Wi-Fi connected"),
            Err(e) => {
                warn!("Wi-Fi connect failed: {:?}", e);
                Timer::after_secs(5).await;
            }
        }
    }
}

/// Bounded wait for the link and a DHCP lease.
///
/// Returns whether the network came up; offline the device runs display-only.
pub async fn wait_for_network(stack: Stack<'static>, timeout: Duration) -> bool {
    if with_timeout(timeout, stack.wait_config_up()).await.is_err() {
        warn!(
            "network not up within {} s, running display-only",
            timeout.as_secs()
        );
        return false;
    }
    if let Some(config) = stack.config_v4() {
        info!("Connect OK, address {}", config.address);
    }
    true
}

/// Single-shot SNTP query. Returns current unix seconds.
pub async fn sntp_unix_time(stack: Stack<'static>, server: &str) -> Option<u32> {
    let address = match stack.dns_query(server, DnsQueryType::A).await {
        Ok(addresses) => addresses.first().copied()?,
        Err(e) => {
            warn!("NTP server DNS lookup failed: {:?}", e);
            return None;
        }
    };

    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0u8; 128];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buffer = [0u8; 128];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    if let Err(e) = socket.bind(NTP_PORT) {
        warn!("NTP socket bind failed: {:?}", e);
        return None;
    }

    // 48-byte client request: LI=0, VN=3, mode=3.
    let mut packet = [0u8; 48];
    packet[0] = 0x1B;
    if let Err(e) = socket.send_to(&packet, (address, NTP_PORT)).await {
        warn!("NTP request send failed: {:?}", e);
        return None;
    }

    let mut response = [0u8; 48];
    match with_timeout(Duration::from_secs(5), socket.recv_from(&mut response)).await {
        Ok(Ok((len, _))) if len >= 44 => {
            // Transmit timestamp seconds, bytes 40..44.
            let seconds =
                u32::from_be_bytes([response[40], response[41], response[42], response[43]]);
            seconds.checked_sub(NTP_UNIX_OFFSET)
        }
        Ok(Ok(_)) => {
            warn!("NTP response too short");
            None
        }
        Ok(Err(e)) => {
            warn!("NTP receive failed: {:?}", e);
            None
        }
        Err(_) => {
            warn!("NTP response timed out");
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("DNS lookup failed")]
    Dns,
    #[error("TCP connect failed")]
    Connect,
    #[error("request encoding failed")]
    Encode,
    #[error("socket I/O failed")]
    Io,
}

/// POST one record to the channel endpoint. Returns the HTTP status code.
pub async fn upload_telemetry(
    stack: Stack<'static>,
    channel_id: u32,
    record: &TelemetryRecord<'_>,
) -> Result<u16, TelemetryError> {
    let address = stack
        .dns_query(TELEMETRY_HOST, DnsQueryType::A)
        .await
        .ok()
        .and_then(|addresses| addresses.first().copied())
        .ok_or(TelemetryError::Dns)?;

    let mut rx_buffer = [0u8; 512];
    let mut tx_buffer = [0u8; 512];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(10)));
    socket
        .connect((address, TELEMETRY_PORT))
        .await
        .map_err(|_| TelemetryError::Connect)?;

    let body: heapless::Vec<u8, 192> =
        serde_json_core::to_vec(record).map_err(|_| TelemetryError::Encode)?;

    let mut header: heapless::String<256> = heapless::String::new();
    core::fmt::write(
        &mut header,
        format_args!(
            "POST /api/v2/channels/{}/data HTTP/1.1\r\n\
             Host: {}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            channel_id,
            TELEMETRY_HOST,
            body.len()
        ),
    )
    .map_err(|_| TelemetryError::Encode)?;

    socket
        .write_all(header.as_bytes())
        .await
        .map_err(|_| TelemetryError::Io)?;
    socket
        .write_all(&body)
        .await
        .map_err(|_| TelemetryError::Io)?;
    socket.flush().await.map_err(|_| TelemetryError::Io)?;

    let mut response = [0u8; 64];
    let len = socket
        .read(&mut response)
        .await
        .map_err(|_| TelemetryError::Io)?;
    socket.close();

    parse_status(&response[..len]).ok_or(TelemetryError::Io)
}

/// Pull the status code out of an HTTP status line.
fn parse_status(response: &[u8]) -> Option<u16> {
    let text = core::str::from_utf8(response).ok()?;
    let mut parts = text.split(' ');
    parts.next()?;
    parts.next()?.parse().ok()
}
