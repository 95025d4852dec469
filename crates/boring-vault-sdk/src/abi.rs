//! Contract surfaces consumed by the SDK.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function name() external view returns (string name);
        function decimals() external view returns (uint8 decimals);
        function balanceOf(address account) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 amount);
        function approve(address spender, uint256 amount) external returns (bool success);
        function nonces(address owner) external view returns (uint256 nonce);
        function version() external view returns (string version);
        function permit(address owner, address spender, uint256 value, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external;
    }

    interface IDaiPermit {
        function permit(address holder, address spender, uint256 nonce, uint256 expiry, bool allowed, uint8 v, bytes32 r, bytes32 s) external;
    }

    interface IBeacon {
        function implementation() external view returns (address implementation);
    }

    interface ITeller {
        function deposit(address depositAsset, uint256 depositAmount, uint256 minimumMint) external payable returns (uint256 shares);
        function depositWithPermit(address depositAsset, uint256 depositAmount, uint256 minimumMint, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external returns (uint256 shares);
        function withdraw(address withdrawAsset, uint256 shareAmount, uint256 minimumAssets, address to) external returns (uint256 assetsOut);
        function shareUnlockTime(address user) external view returns (uint256 unlockTime);
    }

    interface IAccountant {
        function getRateInQuoteSafe(address quote) external view returns (uint256 rateInQuote);
    }

    interface ILens {
        function totalAssets(address boringVault, address accountant) external view returns (address asset, uint256 assets);
        function balanceOf(address account, address boringVault) external view returns (uint256 shares);
        function exchangeRate(address accountant) external view returns (uint256 rate);
    }

    interface IAtomicQueue {
        struct AtomicRequest {
            uint64 deadline;
            uint88 atomicPrice;
            uint96 offerAmount;
            bool inSolve;
        }

        function getUserAtomicRequest(address user, address offer, address want) external view returns (AtomicRequest request);
        function updateAtomicRequest(address offer, address want, AtomicRequest userRequest) external;
        function safeUpdateAtomicRequest(address offer, address want, AtomicRequest userRequest, address accountant, uint256 discount) external;
    }

    interface IBoringOnChainQueue {
        struct OnChainWithdraw {
            uint96 nonce;
            address user;
            address assetOut;
            uint128 amountOfShares;
            uint128 amountOfAssets;
            uint40 creationTime;
            uint24 secondsToMaturity;
            uint24 secondsToDeadline;
        }

        function withdrawAssets(address assetOut) external view returns (bool allowWithdraws, uint24 secondsToMaturity, uint24 minimumSecondsToDeadline, uint16 minDiscount, uint16 maxDiscount, uint96 minimumShares);
        function requestOnChainWithdraw(address assetOut, uint128 amountOfShares, uint16 discount, uint24 secondsToDeadline) external returns (bytes32 requestId);
        function requestOnChainWithdrawWithPermit(address assetOut, uint128 amountOfShares, uint16 discount, uint24 secondsToDeadline, uint256 permitDeadline, uint8 v, bytes32 r, bytes32 s) external returns (bytes32 requestId);
        function cancelOnChainWithdraw(OnChainWithdraw request) external returns (bytes32 requestId);
    }

    interface IDelayedWithdraw {
        function withdrawRequests(address account, address asset) external view returns (bool allowThirdPartyToComplete, uint16 maxLoss, uint40 maturity, uint96 shares, uint96 exchangeRateAtTimeOfRequest);
        function requestWithdraw(address asset, uint96 shares, uint16 maxLoss, bool allowThirdPartyToComplete) external;
        function cancelWithdraw(address asset) external;
        function completeWithdraw(address asset, address account) external returns (uint256 assetsOut);
    }

    interface ILayerZeroTeller {
        struct BridgeData {
            uint32 chainSelector;
            address destinationChainReceiver;
            address bridgeFeeToken;
            uint64 messageGas;
            bytes data;
        }

        function previewFee(uint96 shareAmount, BridgeData data) external view returns (uint256 fee);
        function bridge(uint96 shareAmount, BridgeData data) external payable returns (bytes32 messageId);
        function depositAndBridge(address depositAsset, uint256 depositAmount, uint256 minimumMint, BridgeData data) external payable;
    }

    interface IIncentiveDistributor {
        function claim(address user, bytes32[] rootHashes, address[] tokens, uint256[] balances, bytes32[][] merkleProofs) external;
    }
}
