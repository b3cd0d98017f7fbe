//! 进程内模拟控制器（UDP 回环）
//!
//! 在后台线程中监听 `127.0.0.1` 的临时端口，按真实控制器的帧格式应答：
//!
//! - 运动/输出类响应报告控制器锁存的错误状态；配置类响应报告本次操作的状态
//! - 位置指令相对当前位置的跳变超过 `continuity_factor × 0.5 rad` 时锁存 `InputDiscontinuous`
//! - 指令模式与配置模式不一致时锁存 `InputModeMismatch`
//! - 网络相关字段与出厂重置标志写入后挂起，`power_cycle()` 后才可读到

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, TryRecvError, bounded};
use parking_lot::{Mutex, MutexGuard};
use trossen_sdk::protocol::{
    AlgorithmParameter, CommandIndicator, ConfigurationAddress, ConfigurationFeedback,
    ConfigurationValue, EndEffector, ErrorState, IpMethod, JointCharacteristic, JointInput,
    JointInputsCommand, JointLimit, JointOutput, JointOutputsFeedback, Mode, MotorParameter,
    PidParameter, Request, Response,
};

/// 位置跳变阈值基准（rad），乘以各关节的连续性系数
pub const DISCONTINUITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub factory_reset_flag: bool,
    pub ip_method: IpMethod,
    pub manual_ip: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub subnet: Ipv4Addr,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            factory_reset_flag: false,
            ip_method: IpMethod::Manual,
            manual_ip: Ipv4Addr::new(192, 168, 1, 2),
            dns: Ipv4Addr::new(8, 8, 8, 8),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
            subnet: Ipv4Addr::new(255, 255, 255, 0),
        }
    }
}

/// 控制器内部状态
#[derive(Debug)]
pub struct ControllerState {
    pub num_joints: usize,
    /// 握手中报告的关节数（模拟型号不匹配）
    pub reported_joints: u8,
    pub modes: Vec<Mode>,
    pub inputs: Vec<JointInput>,
    pub outputs: Vec<JointOutput>,
    pub error_state: ErrorState,
    pub log: String,

    pub network: NetworkSettings,
    pub pending_network: NetworkSettings,
    pub joint_characteristics: Vec<JointCharacteristic>,
    pub end_effector: EndEffector,
    pub continuity_factors: Vec<f64>,
    pub joint_limits: Vec<JointLimit>,
    pub motor_parameters: Vec<MotorParameter>,
    pub algorithm_parameter: AlgorithmParameter,

    /// 收到的数据报总数
    pub datagrams: usize,
    /// 按指令类型统计
    pub requests: Vec<CommandIndicator>,
    /// 接下来丢弃的响应数（模拟丢包，请求仍会被处理）
    pub drop_responses: usize,
    /// 不再应答任何请求
    pub silent: bool,
}

impl ControllerState {
    pub fn new(num_joints: usize) -> Self {
        let pid = PidParameter {
            kp: 20.0,
            ki: 0.5,
            kd: 1.25,
            imax: 4.0,
        };
        Self {
            num_joints,
            reported_joints: num_joints as u8,
            modes: vec![Mode::Idle; num_joints],
            inputs: vec![JointInput::Idle; num_joints],
            outputs: vec![JointOutput::default(); num_joints],
            error_state: ErrorState::None,
            log: String::new(),
            network: NetworkSettings::default(),
            pending_network: NetworkSettings::default(),
            joint_characteristics: vec![JointCharacteristic::default(); num_joints],
            end_effector: EndEffector::NO_GRIPPER,
            continuity_factors: vec![1.0; num_joints],
            joint_limits: vec![
                JointLimit {
                    position_min: -3.0,
                    position_max: 3.0,
                    position_tolerance: 0.125,
                    velocity_max: 3.0,
                    velocity_tolerance: 0.5,
                    effort_max: 10.0,
                    effort_tolerance: 1.0,
                };
                num_joints
            ],
            motor_parameters: vec![
                MotorParameter {
                    position: pid,
                    velocity: pid,
                };
                num_joints
            ],
            algorithm_parameter: AlgorithmParameter {
                singularity_threshold: 0.0625,
            },
            datagrams: 0,
            requests: Vec::new(),
            drop_responses: 0,
            silent: false,
        }
    }

    pub fn positions(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.position).collect()
    }

    pub fn velocities(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.velocity).collect()
    }

    fn latch(&mut self, state: ErrorState, log: String) {
        if !self.error_state.is_fault() {
            self.error_state = state;
            self.log = log;
        }
    }

    /// 处理一个请求数据报，返回响应（丢弃时为 `None`）
    pub fn handle(&mut self, datagram: &[u8]) -> Option<Vec<u8>> {
        self.datagrams += 1;
        let request = Request::decode(datagram).ok()?;
        self.requests.push(request.indicator());
        let response = self.dispatch(&request);

        if self.silent {
            return None;
        }
        if self.drop_responses > 0 {
            self.drop_responses -= 1;
            return None;
        }
        Some(response.encode().to_vec())
    }

    fn dispatch(&mut self, request: &Request) -> Response {
        let indicator = request.indicator();
        match indicator {
            CommandIndicator::Handshake => {
                Response::new(indicator, self.error_state, vec![self.reported_joints])
            }
            CommandIndicator::SetJointInputs => {
                if !self.error_state.is_fault() {
                    match JointInputsCommand::parse(request.payload(), self.num_joints) {
                        Ok(inputs) => self.apply_inputs(&inputs),
                        Err(e) => self.latch(ErrorState::InvalidCommandSize, e.to_string()),
                    }
                }
                self.outputs_response(indicator)
            }
            CommandIndicator::GetJointOutputs => self.outputs_response(indicator),
            CommandIndicator::SetHome => {
                if !self.error_state.is_fault() {
                    for output in &mut self.outputs {
                        output.position = 0.0;
                    }
                }
                Response::new(indicator, self.error_state, Vec::<u8>::new())
            }
            CommandIndicator::SetConfiguration => {
                let status = self.write_configuration(request.payload());
                Response::new(indicator, status, Vec::<u8>::new())
            }
            CommandIndicator::GetConfiguration => match self.read_configuration(request.payload()) {
                Some(value) => Response::new(
                    indicator,
                    ErrorState::None,
                    ConfigurationFeedback::encode(&value),
                ),
                None => Response::new(indicator, ErrorState::InvalidConfigurationAddress, Vec::<u8>::new()),
            },
            CommandIndicator::GetLog => {
                Response::new(indicator, ErrorState::None, self.log.clone().into_bytes())
            }
        }
    }

    fn outputs_response(&self, indicator: CommandIndicator) -> Response {
        Response::new(
            indicator,
            self.error_state,
            JointOutputsFeedback::encode(&self.outputs),
        )
    }

    fn apply_inputs(&mut self, inputs: &[JointInput]) {
        // 先整体检查，任何一项不合法都不更新输出
        for (joint, input) in inputs.iter().enumerate() {
            if input.mode() != self.modes[joint] {
                self.latch(
                    ErrorState::InputModeMismatch,
                    format!(
                        "joint {joint}: input mode {:?} but configured {:?}",
                        input.mode(),
                        self.modes[joint]
                    ),
                );
                return;
            }
            if let JointInput::Position { position, .. } = *input {
                let step = (position - self.outputs[joint].position).abs();
                let threshold = self.continuity_factors[joint] * DISCONTINUITY_THRESHOLD;
                if step > threshold {
                    self.latch(
                        ErrorState::InputDiscontinuous,
                        format!("joint {joint}: position step {step:.3} rad exceeds {threshold:.3} rad"),
                    );
                    return;
                }
            }
        }

        for ((input, output), stored) in inputs
            .iter()
            .zip(self.outputs.iter_mut())
            .zip(self.inputs.iter_mut())
        {
            match *input {
                JointInput::Idle => output.velocity = 0.0,
                JointInput::Position {
                    position,
                    feedforward_velocity,
                    ..
                } => {
                    output.position = position;
                    output.velocity = feedforward_velocity;
                }
                JointInput::Velocity { velocity, .. } => output.velocity = velocity,
                JointInput::ExternalEffort { effort } => output.external_effort = effort,
                JointInput::Effort { effort } => output.effort = effort,
            }
            *stored = *input;
        }
    }

    fn write_configuration(&mut self, payload: &[u8]) -> ErrorState {
        let Some((&address, value)) = payload.split_first() else {
            return ErrorState::InvalidConfigurationAddress;
        };
        let Ok(address) = ConfigurationAddress::try_from(address) else {
            return ErrorState::InvalidConfigurationAddress;
        };
        let Ok(value) = ConfigurationValue::decode_write(address, value, self.num_joints) else {
            return ErrorState::InvalidCommand;
        };

        match value {
            ConfigurationValue::FactoryResetFlag(flag) => self.pending_network.factory_reset_flag = flag,
            ConfigurationValue::IpMethod(method) => self.pending_network.ip_method = method,
            ConfigurationValue::ManualIp(ip) => self.pending_network.manual_ip = ip,
            ConfigurationValue::Dns(ip) => self.pending_network.dns = ip,
            ConfigurationValue::Gateway(ip) => self.pending_network.gateway = ip,
            ConfigurationValue::Subnet(ip) => self.pending_network.subnet = ip,
            ConfigurationValue::JointCharacteristics(values) => self.joint_characteristics = values,
            ConfigurationValue::ErrorState(state) => {
                self.error_state = state;
                if !state.is_fault() {
                    self.log.clear();
                }
            }
            ConfigurationValue::Modes(_) => return ErrorState::InvalidCommand,
            ConfigurationValue::JointMode { joint_index, mode } => {
                let joint = joint_index as usize;
                if joint >= self.num_joints {
                    return ErrorState::InvalidCommand;
                }
                self.modes[joint] = mode;
                self.inputs[joint] = JointInput::hold(mode, self.outputs[joint].position);
                if mode != Mode::Position {
                    self.outputs[joint].velocity = 0.0;
                }
            }
            ConfigurationValue::EndEffector(end_effector) => self.end_effector = end_effector,
            ConfigurationValue::ContinuityFactors(values) => self.continuity_factors = values,
            ConfigurationValue::JointLimits(values) => self.joint_limits = values,
            ConfigurationValue::MotorParameters(values) => self.motor_parameters = values,
            ConfigurationValue::AlgorithmParameter(value) => self.algorithm_parameter = value,
        }
        ErrorState::None
    }

    fn read_configuration(&self, payload: &[u8]) -> Option<ConfigurationValue> {
        let address = ConfigurationAddress::try_from(*payload.first()?).ok()?;
        let network = &self.network;
        Some(match address {
            ConfigurationAddress::FactoryResetFlag => {
                ConfigurationValue::FactoryResetFlag(network.factory_reset_flag)
            }
            ConfigurationAddress::IpMethod => ConfigurationValue::IpMethod(network.ip_method),
            ConfigurationAddress::ManualIp => ConfigurationValue::ManualIp(network.manual_ip),
            ConfigurationAddress::Dns => ConfigurationValue::Dns(network.dns),
            ConfigurationAddress::Gateway => ConfigurationValue::Gateway(network.gateway),
            ConfigurationAddress::Subnet => ConfigurationValue::Subnet(network.subnet),
            ConfigurationAddress::JointCharacteristics => {
                ConfigurationValue::JointCharacteristics(self.joint_characteristics.clone())
            }
            ConfigurationAddress::ErrorState => ConfigurationValue::ErrorState(self.error_state),
            ConfigurationAddress::Modes => ConfigurationValue::Modes(self.modes.clone()),
            ConfigurationAddress::EndEffector => ConfigurationValue::EndEffector(self.end_effector),
            ConfigurationAddress::ContinuityFactors => {
                ConfigurationValue::ContinuityFactors(self.continuity_factors.clone())
            }
            ConfigurationAddress::JointLimits => {
                ConfigurationValue::JointLimits(self.joint_limits.clone())
            }
            ConfigurationAddress::MotorParameters => {
                ConfigurationValue::MotorParameters(self.motor_parameters.clone())
            }
            ConfigurationAddress::AlgorithmParameter => {
                ConfigurationValue::AlgorithmParameter(self.algorithm_parameter)
            }
        })
    }
}

/// UDP 回环上的模拟控制器，drop 时停止后台线程
pub struct MockController {
    state: Arc<Mutex<ControllerState>>,
    addr: SocketAddr,
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl MockController {
    pub fn spawn(num_joints: usize) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind mock controller socket");
        socket
            .set_read_timeout(Some(Duration::from_millis(5)))
            .expect("set read timeout");
        let addr = socket.local_addr().expect("local addr");

        let state = Arc::new(Mutex::new(ControllerState::new(num_joints)));
        let (shutdown, shutdown_rx) = bounded::<()>(1);

        let thread_state = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name("mock-controller".to_string())
            .spawn(move || {
                let mut buf = [0u8; 2048];
                loop {
                    match shutdown_rx.try_recv() {
                        Ok(()) | Err(TryRecvError::Disconnected) => break,
                        Err(TryRecvError::Empty) => {}
                    }
                    let (len, peer) = match socket.recv_from(&mut buf) {
                        Ok(received) => received,
                        Err(_) => continue,
                    };
                    let response = thread_state.lock().handle(&buf[..len]);
                    if let Some(response) = response {
                        let _ = socket.send_to(&response, peer);
                    }
                }
            })
            .expect("spawn mock controller thread");

        Self {
            state,
            addr,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock()
    }

    pub fn datagrams(&self) -> usize {
        self.state.lock().datagrams
    }

    /// 预置控制器故障
    pub fn inject_fault(&self, state: ErrorState, log: &str) {
        let mut guard = self.state.lock();
        guard.error_state = state;
        guard.log = log.to_string();
    }

    /// 模拟重新上电：挂起的网络设置生效，关节回到空闲
    pub fn power_cycle(&self) {
        let mut guard = self.state.lock();
        guard.network = guard.pending_network.clone();
        let num_joints = guard.num_joints;
        guard.modes = vec![Mode::Idle; num_joints];
        guard.inputs = vec![JointInput::Idle; num_joints];
    }
}

impl Drop for MockController {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
