//! `get_wifi_info`: network name, address and signal strength.

use crate::tool::{Tool, ToolContext, ToolOutput, write_result};
use femtoclaw_core::bounded::Text;
use femtoclaw_core::json::escape_into;
use femtoclaw_core::limits::CFG_CAP;

pub struct WifiInfoTool;

impl Tool for WifiInfoTool {
    fn name(&self) -> &'static str {
        "get_wifi_info"
    }

    fn description(&self) -> &'static str {
        "Report the connected network SSID, IP address and RSSI."
    }

    fn execute(&self, _args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput) {
        let net = ctx.platform.network();
        let mut ssid: Text<{ CFG_CAP * 2 }> = Text::new();
        escape_into(&net.ssid, &mut ssid);
        write_result(
            out,
            format_args!(
                r#"{{"ssid":"{}","ip":"{}","rssi":{}}}"#,
                ssid, net.ip, net.rssi
            ),
        );
    }
}
