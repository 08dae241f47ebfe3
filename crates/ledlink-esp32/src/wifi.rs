//! Access point bring-up for ESP32.
//!
//! The device runs its own network: it advertises a fixed SSID and assigns
//! itself a fixed address, handing out leases to clients on the same subnet.

use anyhow::{anyhow, Result};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{modem::Modem, peripheral},
    ipv4::{self, Mask, RouterConfiguration, Subnet},
    netif::{EspNetif, NetifConfiguration, NetifStack},
    nvs::EspDefaultNvsPartition,
    wifi::{AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi, WifiDriver},
};
use log::{info, warn};

use ledlink_core::AccessPointConfig;

/// Start the access point described by `config`.
///
/// An empty passphrase gives an open network. If the fixed address cannot be
/// applied, the failure is logged and the AP comes up with the driver's
/// default addressing instead.
///
/// Returns a boxed `EspWifi` instance that must be kept alive for the access
/// point to stay up.
pub fn start_access_point(
    modem: impl peripheral::Peripheral<P = Modem> + 'static,
    sysloop: EspSystemEventLoop,
    nvs: Option<EspDefaultNvsPartition>,
    config: &AccessPointConfig,
) -> Result<Box<EspWifi<'static>>> {
    info!("Setting AP (Access Point) '{}'...", config.ssid);

    let auth_method = if config.is_open() {
        info!("AP passphrase is empty, using open network");
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    let driver = WifiDriver::new(modem, sysloop.clone(), nvs)?;
    let ap_netif = match router_netif(config) {
        Ok(netif) => netif,
        Err(e) => {
            warn!("AP configuration failed: {:?}", e);
            EspNetif::new(NetifStack::Ap)?
        }
    };
    let mut esp_wifi = EspWifi::wrap_all(driver, EspNetif::new(NetifStack::Sta)?, ap_netif)?;
    let mut wifi = BlockingWifi::wrap(&mut esp_wifi, sysloop)?;

    wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
        ssid: config
            .ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("SSID too long (max 32 chars)"))?,
        password: config
            .password
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("Password too long (max 64 chars)"))?,
        auth_method,
        channel: 1,
        ..Default::default()
    }))?;

    wifi.start()?;
    wifi.wait_netif_up()?;

    let ip_info = wifi.wifi().ap_netif().get_ip_info()?;
    info!("AP configuration successful");
    info!("  AP IP address: {}", ip_info.ip);
    info!("  Netmask:       {}", ip_info.subnet.mask);

    Ok(Box::new(esp_wifi))
}

/// Router-mode netif with the configured fixed address.
///
/// In router mode the device's own address is the subnet gateway.
fn router_netif(config: &AccessPointConfig) -> Result<EspNetif> {
    if config.address != config.gateway {
        warn!(
            "AP address {} differs from gateway {}, using {}",
            config.address, config.gateway, config.address
        );
    }

    let conf = NetifConfiguration {
        ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
            subnet: Subnet {
                gateway: config.address,
                mask: Mask(config.prefix_len()),
            },
            dhcp_enabled: true,
            dns: Some(config.address),
            secondary_dns: None,
        })),
        ..NetifConfiguration::wifi_default_router()
    };

    Ok(EspNetif::new_with_conf(&conf)?)
}
