//! Configuration menus.
//!
//! The main menu looks a device up by IP and hands it to the router or
//! switch menu. Every configuration option gathers and validates its
//! parameters first, then runs one [`Device::apply`] job: connect, send the
//! block, print whatever came back, close.

use std::io::{self, BufRead, Write};

use tracing::{error, info};

use super::prompt::Prompter;
use crate::commands::{self, CommandError};
use crate::config::Config;
use crate::core::session::Backend;
use crate::device::Device;
use crate::inventory::{DeviceClass, Inventory};

/// Main menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainAction {
    ConfigureDevice,
    Exit,
}

/// Router menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    Hsrp,
    Dhcp,
    RipV2,
    Back,
}

/// Switch menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAction {
    Vlan,
    PortSecurity,
    Stp,
    Hsrp,
    Back,
}

/// A numbered menu entry
#[derive(Debug, Clone)]
pub struct MenuItem<A> {
    pub key: &'static str,
    pub label: &'static str,
    pub action: A,
}

const MAIN_MENU: &[MenuItem<MainAction>] = &[
    MenuItem { key: "1", label: "Configure a device.", action: MainAction::ConfigureDevice },
    MenuItem { key: "2", label: "Exit the application.", action: MainAction::Exit },
];

const ROUTER_MENU: &[MenuItem<RouterAction>] = &[
    MenuItem { key: "1", label: "Configure HSRP for a VLAN.", action: RouterAction::Hsrp },
    MenuItem { key: "2", label: "Configure a DHCP server.", action: RouterAction::Dhcp },
    MenuItem { key: "3", label: "Set up RIPv2.", action: RouterAction::RipV2 },
    MenuItem { key: "4", label: "Exit to Main Menu.", action: RouterAction::Back },
];

const SWITCH_MENU: &[MenuItem<SwitchAction>] = &[
    MenuItem { key: "1", label: "Configure a VLAN.", action: SwitchAction::Vlan },
    MenuItem { key: "2", label: "Configure port security.", action: SwitchAction::PortSecurity },
    MenuItem { key: "3", label: "Configure STP.", action: SwitchAction::Stp },
    MenuItem { key: "4", label: "Configure HSRP (multilayer switches only).", action: SwitchAction::Hsrp },
    MenuItem { key: "5", label: "Exit to Main Menu.", action: SwitchAction::Back },
];

/// Interactive front end over the inventory
pub struct App<R, W> {
    inventory: Inventory,
    config: Config,
    backend: Backend,
    prompter: Prompter<R, W>,
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn new(inventory: Inventory, config: Config, backend: Backend, prompter: Prompter<R, W>) -> Self {
        Self {
            inventory,
            config,
            backend,
            prompter,
        }
    }

    #[allow(dead_code)]
    pub fn prompter(&self) -> &Prompter<R, W> {
        &self.prompter
    }

    /// Run until the operator exits or input ends
    pub fn run(&mut self) -> io::Result<()> {
        match self.main_loop() {
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                info!("Input closed, leaving");
                Ok(())
            }
            other => other,
        }
    }

    fn main_loop(&mut self) -> io::Result<()> {
        loop {
            self.prompter.say("")?;
            self.prompter.heading("Welcome to the Main Menu of the Network Automation Tool!")?;
            match self.choose("The following options are available:", MAIN_MENU)? {
                Some(MainAction::ConfigureDevice) => self.configure_device()?,
                Some(MainAction::Exit) => {
                    self.prompter.say("Thank you for using the Network Automation Tool!")?;
                    return Ok(());
                }
                None => {}
            }
        }
    }

    /// Show a menu and read one choice; `None` after an invalid entry
    fn choose<A: Copy>(&mut self, title: &str, items: &[MenuItem<A>]) -> io::Result<Option<A>> {
        self.prompter.say(title)?;
        for item in items {
            self.prompter.say(format!("  {}. {}", item.key, item.label))?;
        }

        let choice = self.prompter.ask("Enter your choice: ")?;
        match items.iter().find(|item| item.key == choice) {
            Some(item) => Ok(Some(item.action)),
            None => {
                self.prompter.error("Invalid choice. Please try again.")?;
                Ok(None)
            }
        }
    }

    fn configure_device(&mut self) -> io::Result<()> {
        let ip = self.prompter.ask("Enter the IP of the device you want to configure: ")?;

        let Some(record) = self.inventory.find_by_ip(&ip).cloned() else {
            self.prompter.error(&format!(
                "Device with IP {} not found. Please check the IP or add it to the device list.",
                ip
            ))?;
            return Ok(());
        };

        match record.class() {
            Some(DeviceClass::Router) => {
                let mut device = Device::new(record, self.backend.clone());
                self.router_menu(&mut device)
            }
            Some(DeviceClass::Switch) => {
                let mut device = Device::new(record, self.backend.clone());
                self.switch_menu(&mut device)
            }
            None => self.prompter.error(&format!(
                "Unknown device type '{}' for IP: {}",
                record.kind, ip
            )),
        }
    }

    fn router_menu(&mut self, device: &mut Device) -> io::Result<()> {
        loop {
            let title = format!(
                "The following configuration options are available for the Router {}:",
                device.name()
            );
            match self.choose(&title, ROUTER_MENU)? {
                Some(RouterAction::Hsrp) => self.config_hsrp(device)?,
                Some(RouterAction::Dhcp) => self.setup_dhcp(device)?,
                Some(RouterAction::RipV2) => self.config_ripv2(device)?,
                Some(RouterAction::Back) => return Ok(()),
                None => {}
            }
        }
    }

    fn switch_menu(&mut self, device: &mut Device) -> io::Result<()> {
        loop {
            let title = format!(
                "The following configuration options are available for the Switch {}:",
                device.name()
            );
            match self.choose(&title, SWITCH_MENU)? {
                Some(SwitchAction::Vlan) => self.config_vlan(device)?,
                Some(SwitchAction::PortSecurity) => self.config_port_security(device)?,
                Some(SwitchAction::Stp) => self.config_stp(device)?,
                Some(SwitchAction::Hsrp) => {
                    if device.record().is_multilayer() {
                        self.config_hsrp(device)?;
                    } else {
                        self.prompter.error(
                            "This is not a multilayer switch, HSRP configuration is not supported.",
                        )?;
                    }
                }
                Some(SwitchAction::Back) => return Ok(()),
                None => {}
            }
        }
    }

    fn config_hsrp(&mut self, device: &mut Device) -> io::Result<()> {
        let interface = self.prompter.ask("Enter the ID of the interface (e.g., Gi0/1): ")?;
        let group = self.prompter.ask("Enter the ID of the standby group (e.g., 1): ")?;
        let virtual_ip = self.prompter.ask("Enter the IP address of the Virtual Router: ")?;
        let priority = self
            .prompter
            .ask("Enter the priority of the physical interface (default 100): ")?;

        let block = commands::hsrp(&commands::Hsrp {
            interface,
            group,
            virtual_ip,
            priority: commands::parse_priority(&priority),
        });
        self.run_job(device, "HSRP", &block)
    }

    fn setup_dhcp(&mut self, device: &mut Device) -> io::Result<()> {
        let lan_id = self.prompter.ask("Enter the ID of the LAN: ")?;
        let pool_network = self.prompter.ask("Enter the IP address of the DHCP pool: ")?;
        let subnet_mask = self.prompter.ask("Enter the subnet mask: ")?;
        let switches = self.prompter.ask("Enter the number of switches in the LAN: ")?;
        let routers = self.prompter.ask("Enter the number of routers in the LAN: ")?;

        let block = commands::parse_gateway(device.ip()).and_then(|gateway| {
            commands::dhcp(&commands::Dhcp {
                lan_id,
                pool_network,
                subnet_mask,
                gateway,
                switches: commands::parse_count("switches", &switches)?,
                routers: commands::parse_count("routers", &routers)?,
                dns_server: self.config.dhcp.dns_server.clone(),
            })
        });

        match block {
            Ok(block) => self.run_job(device, "DHCP", &block),
            Err(e) => self.invalid_input(e),
        }
    }

    fn config_ripv2(&mut self, device: &mut Device) -> io::Result<()> {
        let first = self.prompter.ask("Enter the IP address of the first network: ")?;
        let second = self.prompter.ask("Enter the IP address of the second network: ")?;
        let redistribute = self
            .prompter
            .ask("Do you want to redistribute the static routes from this device? (y/n): ")?;

        let redistribute_static = match commands::parse_yes_no(&redistribute) {
            Some(answer) => answer,
            None => {
                self.prompter
                    .say("Invalid option. Static routes will not be redistributed.")?;
                false
            }
        };

        let block = commands::ripv2(&commands::RipV2 {
            networks: vec![first, second],
            redistribute_static,
        });
        self.run_job(device, "RIPv2", &block)
    }

    fn config_vlan(&mut self, device: &mut Device) -> io::Result<()> {
        let id = self.prompter.ask("Enter the VLAN ID to create (e.g., '10'): ")?;
        let name = self
            .prompter
            .ask("Enter the name of the VLAN (e.g., 'Management_VLAN'): ")?;

        let id = match commands::parse_vlan_id(&id) {
            Ok(id) => id,
            Err(e) => return self.invalid_input(e),
        };

        let block = commands::vlan(id, &name);
        if let Some(output) = self.run_job_quiet(device, "VLAN", &block)? {
            self.prompter
                .success(&format!("VLAN {} ({}) created successfully:", id, name))?;
            self.prompter.say(output)?;
        }
        Ok(())
    }

    fn config_port_security(&mut self, device: &mut Device) -> io::Result<()> {
        let interface = self.prompter.ask(
            "Enter the name of the interface for security configuration (e.g., 'GigabitEthernet0/1'): ",
        )?;
        let vlan = self
            .prompter
            .ask("Enter the VLAN ID to allow on the interface: ")?;

        let block = commands::port_security(&commands::PortSecurity { interface, vlan });
        self.run_job(device, "port security", &block)
    }

    fn config_stp(&mut self, device: &mut Device) -> io::Result<()> {
        let primary = self
            .prompter
            .ask("Enter the VLAN ID to set as primary (or 'q' to skip): ")?;
        let secondary = self
            .prompter
            .ask("Enter the VLAN ID to set as secondary (or 'q' to skip): ")?;

        let block = commands::stp(&commands::Stp {
            primary: commands::parse_skippable(&primary),
            secondary: commands::parse_skippable(&secondary),
        });
        self.run_job(device, "STP", &block)
    }

    /// Apply a block and print the generic success message
    fn run_job(&mut self, device: &mut Device, job: &str, block: &str) -> io::Result<()> {
        if let Some(output) = self.run_job_quiet(device, job, block)? {
            self.prompter
                .success(&format!("{} configuration successful:", job))?;
            self.prompter.say(output)?;
        }
        Ok(())
    }

    /// Apply a block; prints failures, returns the output on success
    fn run_job_quiet(&mut self, device: &mut Device, job: &str, block: &str) -> io::Result<Option<String>> {
        match device.apply(job, block, self.config.connect_timeout()) {
            Ok(output) => Ok(Some(output)),
            Err(e) => {
                self.prompter
                    .error(&format!("{} configuration failed: {}", job, e))?;
                Ok(None)
            }
        }
    }

    fn invalid_input(&mut self, err: CommandError) -> io::Result<()> {
        error!("Invalid input: {}", err);
        self.prompter.error(&format!("Error: {}", err))
    }
}
