//! Remote access URLs for forwarded cameras

use crate::client::ClientRecord;

/// `http://` and `rtsp://` entry points per camera, reachable over the
/// tunnel. Empty when DNAT is off or a camera address is missing.
pub fn generate_camera_urls(record: &ClientRecord) -> String {
    let Some(cameras) = record.cameras() else {
        return String::new();
    };
    if !cameras.is_complete() {
        return String::new();
    }

    let host = record.tunnel_address();
    let mut text = String::new();
    for (n, address, ports) in cameras.cameras() {
        text.push_str(&format!("CAMARA {} ({}):\n", n, address));
        text.push_str(&format!("HTTP: http://{}:{}\n", host, ports.http));
        text.push_str(&format!("RTSP: rtsp://{}:{}/...\n\n", host, ports.rtsp));
    }
    text
}
