//! Statically typed call surfaces of the deployed contracts.
//!
//! One interface per contract, one entry per on-chain function the client
//! uses. Argument types are checked at compile time; the artifact ABI is
//! checked against these selectors when a proxy binds.

use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// NGT energy token.
    interface INgt {
        function mint(address beneficiary, uint256 amount) external;
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool success);
        function balanceOf(address account) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
    }

    /// Registry binding each DSO to its own markets manager.
    interface IGroupsManager {
        function addGroup(address dso) external;
        function getFlag(address dso) external view returns (bool exists);
        function getAddress(address dso) external view returns (address manager);
    }

    /// Per-DSO market lifecycle contract.
    interface IMarketsManager {
        function open(
            address player,
            uint256 startTime,
            uint8 marketType,
            address referee,
            uint256 maxLower,
            uint256 maxUpper,
            uint256 revenueFactor,
            uint256 penaltyFactor,
            uint256 dsoStaking,
            uint256 playerStaking,
            uint256 percReferee
        ) external;
        function confirmOpening(uint256 idx, uint256 staking) external;
        function settle(uint256 idx, uint256 powerPeak) external;
        function confirmSettlement(uint256 idx, uint256 powerPeak) external;
        function getState(uint256 idx) external view returns (uint8 state);
        function getFlag(uint256 idx) external view returns (bool exists);
        function getStartTime(uint256 idx) external view returns (uint256 startTime);
        function getEndTime(uint256 idx) external view returns (uint256 endTime);
        function getPlayer(uint256 idx) external view returns (address player);
        function calcIdx(address player, uint256 startTime, uint8 marketType) external pure returns (uint256 idx);
    }
}

/// A function the artifact must expose: (signature, selector).
pub type RequiredFunction = (&'static str, [u8; 4]);

macro_rules! required {
    ($($call:ty),+ $(,)?) => {
        &[$((<$call as SolCall>::SIGNATURE, <$call as SolCall>::SELECTOR)),+]
    };
}

pub const NGT_FUNCTIONS: &[RequiredFunction] = required![
    INgt::mintCall,
    INgt::increaseAllowanceCall,
    INgt::balanceOfCall,
    INgt::allowanceCall,
];

pub const GROUPS_MANAGER_FUNCTIONS: &[RequiredFunction] = required![
    IGroupsManager::addGroupCall,
    IGroupsManager::getFlagCall,
    IGroupsManager::getAddressCall,
];

pub const MARKETS_MANAGER_FUNCTIONS: &[RequiredFunction] = required![
    IMarketsManager::openCall,
    IMarketsManager::confirmOpeningCall,
    IMarketsManager::settleCall,
    IMarketsManager::confirmSettlementCall,
    IMarketsManager::getStateCall,
    IMarketsManager::getFlagCall,
    IMarketsManager::getStartTimeCall,
    IMarketsManager::getEndTimeCall,
    IMarketsManager::getPlayerCall,
    IMarketsManager::calcIdxCall,
];
